//! Steam OpenID sign-in.
//!
//! Steam only supports OpenID 2.0 in `checkid_setup` mode: the user is
//! sent to `steamcommunity.com`, signs in there, and gets redirected
//! back to us with their Steam ID inside `openid.claimed_id`.
//!
//! The redirect can come back two ways:
//! 1. As the return value of the interactive [`RedirectSession`]
//!    ([`IdentityBroker::begin_login`]).
//! 2. Out-of-band, as a deep link into the app
//!    ([`IdentityBroker::handle_deep_link`] / [`IdentityBroker::listen`]).

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use sv_core::{err, info, pt, SteamId};
use tokio::{sync::mpsc, task::JoinHandle};
use url::{form_urlencoded, Url};

use crate::session::{IdentityUpdate, SessionManager};

pub const STEAM_OPENID_ENDPOINT: &str = "https://steamcommunity.com/openid/login";
const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";
const OPENID_IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";

/// Custom URL scheme the app registers for callbacks.
pub const DEEP_LINK_SCHEME: &str = "steamviewer";
pub const DEFAULT_REDIRECT_URI: &str = "steamviewer://auth";

/// Token used when a Steam account gets linked before
/// anything else signed the user in.
pub const DEFAULT_SESSION_TOKEN: &str = "steam-token";

/// Query keys that may carry the claimed identity URL.
const CLAIMED_ID_KEYS: &[&str] = &["openid.claimed_id", "claimed_id", "openid_claimed_id"];
const STEAM_ID_KEY: &str = "steamid";

/// Result of an interactive redirect session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// The flow came back to the redirect URI.
    Success(String),
    /// The user closed the browser / aborted.
    Cancelled,
    Failed(String),
}

/// Opens `auth_url` for the user and waits until the provider
/// redirects to `redirect_uri`, the user gives up, or it fails.
#[async_trait]
pub trait RedirectSession: Send + Sync {
    async fn open(&self, auth_url: &str, redirect_uri: &str) -> RedirectOutcome;
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Steam sign-in failed: {0}")]
    Failed(String),
    #[error("Steam sign-in returned no Steam ID (callback: {0})")]
    IdentifierNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Linked(SteamId),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLinkOutcome {
    Linked(SteamId),
    /// A Steam ID is already bound; the link was ignored.
    AlreadyLinked,
    /// This exact URL was handled before.
    Duplicate,
    NoIdentifier,
}

/// Build the Steam OpenID login URL that returns to `redirect_uri`.
#[must_use]
pub fn authorization_url(redirect_uri: &str) -> String {
    let params = [
        ("openid.ns", OPENID_NS),
        ("openid.mode", "checkid_setup"),
        ("openid.return_to", redirect_uri),
        ("openid.realm", redirect_uri),
        ("openid.identity", OPENID_IDENTIFIER_SELECT),
        ("openid.claimed_id", OPENID_IDENTIFIER_SELECT),
    ];
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{STEAM_OPENID_ENDPOINT}?{query}")
}

/// Pull the Steam ID out of a callback URL.
///
/// Accepts either `openid.claimed_id=https://steamcommunity.com/openid/id/<digits>`
/// (the last path segment is the ID) or a bare `steamid=<digits>`,
/// in the query or the fragment. Works on full URLs, custom-scheme
/// deep links and bare query strings.
#[must_use]
pub fn extract_identifier(url: &str) -> Option<SteamId> {
    let url = url.trim();
    let (query, fragment) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.query().map(str::to_owned),
            parsed.fragment().map(str::to_owned),
        ),
        Err(_) => {
            let rest = url.split_once('?').map_or(url, |(_, q)| q);
            match rest.split_once('#') {
                Some((q, f)) => (Some(q.to_owned()), Some(f.to_owned())),
                None => (Some(rest.to_owned()), None),
            }
        }
    };

    query
        .iter()
        .chain(fragment.iter())
        .find_map(|part| identifier_from_params(part))
}

fn identifier_from_params(params: &str) -> Option<SteamId> {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(params.as_bytes())
        .into_owned()
        .collect();

    let claimed = pairs
        .iter()
        .find(|(k, _)| CLAIMED_ID_KEYS.contains(&k.as_str()))
        .map(|(_, v)| v.trim_end_matches('/'));
    if let Some(claimed) = claimed {
        let last = claimed.rsplit('/').next().unwrap_or(claimed);
        if let Ok(id) = SteamId::new(last) {
            return Some(id);
        }
    }

    pairs
        .iter()
        .find(|(k, _)| k == STEAM_ID_KEY)
        .and_then(|(_, v)| SteamId::new(v.as_str()).ok())
}

/// Drives sign-in and feeds the resulting Steam ID into the session.
pub struct IdentityBroker {
    session: Arc<SessionManager>,
    redirect: Arc<dyn RedirectSession>,
    redirect_uri: String,
    seen: Mutex<HashSet<String>>,
}

impl IdentityBroker {
    #[must_use]
    pub fn new(
        session: Arc<SessionManager>,
        redirect: Arc<dyn RedirectSession>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            session,
            redirect,
            redirect_uri: redirect_uri.into(),
            seen: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Run the interactive Steam sign-in.
    ///
    /// On success the Steam ID is linked to the session (replacing any
    /// previous one; this is an explicit user action). Cancelling
    /// is not an error.
    pub async fn begin_login(&self) -> Result<LoginOutcome, BrokerError> {
        let auth_url = authorization_url(&self.redirect_uri);
        info!("Starting Steam sign-in");

        let callback = match self.redirect.open(&auth_url, &self.redirect_uri).await {
            RedirectOutcome::Success(callback) => callback,
            RedirectOutcome::Cancelled => {
                pt!("Steam sign-in cancelled");
                return Ok(LoginOutcome::Cancelled);
            }
            RedirectOutcome::Failed(reason) => {
                err!("Steam sign-in failed: {reason}");
                return Err(BrokerError::Failed(reason));
            }
        };
        self.mark_seen(&callback);

        let Some(id) = extract_identifier(&callback) else {
            return Err(BrokerError::IdentifierNotFound(callback));
        };
        let token = self
            .session
            .token()
            .unwrap_or_else(|| DEFAULT_SESSION_TOKEN.to_owned());
        self.session
            .authenticate(&token, IdentityUpdate::Set(id.clone()))
            .await;
        Ok(LoginOutcome::Linked(id))
    }

    /// Handle a URL that arrived through the app's deep-link handler.
    ///
    /// Each distinct URL is processed once, and an already linked
    /// Steam ID is never overwritten.
    pub async fn handle_deep_link(&self, url: &str) -> DeepLinkOutcome {
        if !self.mark_seen(url) {
            return DeepLinkOutcome::Duplicate;
        }
        if self.session.steam_id().is_some() {
            pt!("Ignoring sign-in callback, a Steam account is already linked");
            return DeepLinkOutcome::AlreadyLinked;
        }
        let Some(id) = extract_identifier(url) else {
            return DeepLinkOutcome::NoIdentifier;
        };
        if self
            .session
            .bind_identity(id.clone(), DEFAULT_SESSION_TOKEN)
            .await
        {
            DeepLinkOutcome::Linked(id)
        } else {
            DeepLinkOutcome::AlreadyLinked
        }
    }

    /// Spawn a task handling every URL sent through `links`
    /// until all senders are dropped.
    pub fn listen(self: Arc<Self>, mut links: mpsc::UnboundedReceiver<String>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(url) = links.recv().await {
                if let DeepLinkOutcome::NoIdentifier = self.handle_deep_link(&url).await {
                    err!("Deep link carried no Steam ID: {url}");
                }
            }
        })
    }

    /// Returns `true` if `url` wasn't seen before.
    /// Surrounding whitespace doesn't make a URL distinct.
    fn mark_seen(&self, url: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.trim().to_owned())
    }
}
