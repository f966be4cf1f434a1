//! The session: an opaque token plus the linked Steam ID.
//!
//! [`SessionManager`] is the only writer. It updates the in-memory
//! state first (observers see it immediately through [`SessionManager::subscribe`])
//! and then persists to the [`CredentialStore`] on a best-effort basis:
//! store failures are logged, never returned.

use std::sync::Arc;

use sv_core::{err, info, pt, SteamId};
use tokio::sync::watch;

use crate::store::{CredentialKey, CredentialStore};

/// In-memory session state, as published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub steam_id: Option<SteamId>,
    pub is_loading: bool,
    initialized: bool,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.is_loading {
            SessionState::Loading
        } else if !self.initialized {
            SessionState::Uninitialized
        } else if self.token.is_none() {
            SessionState::Anonymous
        } else if self.steam_id.is_none() {
            SessionState::AuthenticatedNoIdentity
        } else {
            SessionState::AuthenticatedWithIdentity
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Anonymous,
    /// Signed in, but no Steam account linked
    /// (or it was disconnected).
    AuthenticatedNoIdentity,
    AuthenticatedWithIdentity,
}

/// What [`SessionManager::authenticate`] does with the Steam ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityUpdate {
    /// Leave the current identifier alone.
    Keep,
    /// Unlink: clear it and remove it from the store.
    Clear,
    Set(SteamId),
}

impl IdentityUpdate {
    /// An empty value means [`IdentityUpdate::Clear`].
    pub fn from_value(value: &str) -> Result<Self, sv_core::InvalidSteamId> {
        if value.is_empty() {
            Ok(Self::Clear)
        } else {
            SteamId::new(value).map(Self::Set)
        }
    }
}

impl From<SteamId> for IdentityUpdate {
    fn from(value: SteamId) -> Self {
        Self::Set(value)
    }
}

pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<Session>,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            state: watch::Sender::new(Session::default()),
        }
    }

    /// Hydrate the session from the credential store.
    ///
    /// Never fails: unreadable entries or a malformed Steam ID
    /// are logged and treated as absent. `is_loading` is always
    /// `false` again once this returns.
    pub async fn initialize(&self) -> SessionState {
        self.state.send_modify(|s| s.is_loading = true);

        let token = self.read(CredentialKey::Token).await;
        let steam_id = self
            .read(CredentialKey::SteamId)
            .await
            .and_then(|raw| match SteamId::new(raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    err!("Ignoring stored Steam ID: {e}");
                    None
                }
            });

        self.state.send_modify(|s| {
            s.token = token;
            s.steam_id = steam_id;
            s.is_loading = false;
            s.initialized = true;
        });

        let state = self.state();
        info!("Session restored: {state:?}");
        state
    }

    /// Sign in with `token` and update the linked Steam ID as `identity` says.
    ///
    /// An empty `token` leaves the current token untouched.
    pub async fn authenticate(&self, token: &str, identity: IdentityUpdate) {
        self.state.send_modify(|s| {
            if !token.is_empty() {
                s.token = Some(token.to_owned());
            }
            match &identity {
                IdentityUpdate::Keep => {}
                IdentityUpdate::Clear => s.steam_id = None,
                IdentityUpdate::Set(id) => s.steam_id = Some(id.clone()),
            }
            s.initialized = true;
        });

        if token.is_empty() {
            err!("authenticate called with an empty token, keeping the current one");
        } else {
            self.write(CredentialKey::Token, token).await;
        }
        match identity {
            IdentityUpdate::Keep => {}
            IdentityUpdate::Clear => self.delete(CredentialKey::SteamId).await,
            IdentityUpdate::Set(id) => {
                pt!("Linked Steam account {id}");
                self.write(CredentialKey::SteamId, id.as_str()).await;
            }
        }
    }

    /// Link `id` only if no Steam ID is bound yet.
    ///
    /// Returns `false` (and changes nothing) if one already is,
    /// so duplicate or racing callback deliveries can't overwrite it.
    /// Without a token the session is signed in with `fallback_token`.
    pub async fn bind_identity(&self, id: SteamId, fallback_token: &str) -> bool {
        let mut new_token = None;
        let bound = self.state.send_if_modified(|s| {
            if s.steam_id.is_some() {
                return false;
            }
            if s.token.is_none() {
                s.token = Some(fallback_token.to_owned());
                new_token = s.token.clone();
            }
            s.steam_id = Some(id.clone());
            s.initialized = true;
            true
        });
        if !bound {
            return false;
        }

        pt!("Linked Steam account {id}");
        if let Some(token) = new_token {
            self.write(CredentialKey::Token, &token).await;
        }
        self.write(CredentialKey::SteamId, id.as_str()).await;
        true
    }

    /// Sign out completely: token and Steam ID are both cleared.
    pub async fn logout(&self) {
        self.state.send_modify(|s| {
            s.token = None;
            s.steam_id = None;
        });
        info!("Logged out");
        self.delete(CredentialKey::Token).await;
        self.delete(CredentialKey::SteamId).await;
    }

    /// Unlink the Steam account but stay signed in.
    pub async fn disconnect_identity(&self) {
        self.state.send_modify(|s| s.steam_id = None);
        info!("Disconnected Steam account");
        self.delete(CredentialKey::SteamId).await;
    }

    /// Receive every future state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().state()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    #[must_use]
    pub fn steam_id(&self) -> Option<SteamId> {
        self.state.borrow().steam_id.clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    async fn read(&self, key: CredentialKey) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                err!("Could not read {key} from credential store: {e}");
                None
            }
        }
    }

    async fn write(&self, key: CredentialKey, value: &str) {
        if let Err(e) = self.store.set(key, value).await {
            err!("Could not save {key} to credential store: {e}");
        }
    }

    async fn delete(&self, key: CredentialKey) {
        if let Err(e) = self.store.remove(key).await {
            err!("Could not remove {key} from credential store: {e}");
        }
    }
}
