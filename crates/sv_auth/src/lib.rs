//! # Steam Viewer auth
//!
//! Everything about who the user is:
//! - [`store`]: where the session token and Steam ID are persisted
//!   ([`encrypted_store`] when there is no system keyring)
//! - [`session`]: the in-memory session and its state machine
//! - [`broker`]: Steam OpenID sign-in and deep-link callbacks

pub mod broker;
pub mod encrypted_store;
pub mod session;
pub mod store;

pub use broker::{
    authorization_url, extract_identifier, BrokerError, DeepLinkOutcome, IdentityBroker,
    LoginOutcome, RedirectOutcome, RedirectSession,
};
pub use encrypted_store::EncryptedFileCredentialStore;
pub use session::{IdentityUpdate, Session, SessionManager, SessionState};
pub use store::{
    CredentialKey, CredentialStore, KeyringCredentialStore, MemoryCredentialStore, StoreError,
    TokenStorageMethod,
};
