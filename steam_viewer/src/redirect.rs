//! Terminal version of the sign-in browser session.
//!
//! Opens the Steam login page in the system browser, then asks the
//! user to paste the address Steam redirected them to.

use async_trait::async_trait;
use owo_colors::OwoColorize;
use sv_auth::{RedirectOutcome, RedirectSession};
use sv_core::err;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::Mutex,
};

type Opener = fn(&str) -> std::io::Result<()>;

pub struct PastedRedirectSession<R> {
    input: Mutex<R>,
    opener: Opener,
}

impl PastedRedirectSession<tokio::io::BufReader<tokio::io::Stdin>> {
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()), |url| {
            open::that(url)
        })
    }
}

impl<R> PastedRedirectSession<R> {
    pub fn new(input: R, opener: Opener) -> Self {
        Self {
            input: Mutex::new(input),
            opener,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> RedirectSession for PastedRedirectSession<R> {
    async fn open(&self, auth_url: &str, redirect_uri: &str) -> RedirectOutcome {
        if let Err(e) = (self.opener)(auth_url) {
            err!("Couldn't open a browser: {e}");
            println!("Open this page to sign in:\n{}", auth_url.underline());
        }
        println!(
            "Sign in with Steam, then paste the address you were sent to\n(it starts with {}). Leave empty to cancel:",
            redirect_uri.bold()
        );

        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await;
        match read {
            Ok(_) => classify(&line, redirect_uri),
            Err(e) => RedirectOutcome::Failed(e.to_string()),
        }
    }
}

/// What the pasted `input` means for a sign-in returning to `redirect_uri`.
fn classify(input: &str, redirect_uri: &str) -> RedirectOutcome {
    let input = input.trim();
    if input.is_empty() {
        RedirectOutcome::Cancelled
    } else if input.starts_with(redirect_uri) {
        RedirectOutcome::Success(input.to_owned())
    } else {
        RedirectOutcome::Failed(format!("{input:?} is not a {redirect_uri} address"))
    }
}
