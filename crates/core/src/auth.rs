//! Login flow for the reader site.
//!
//! Logging in takes three round trips:
//!
//! 1. the landing page carries an anti-forgery token in `<meta name="csrf-token">`,
//! 2. the setup endpoint trades that token for a login authenticity token,
//! 3. the login form is posted with the credentials and the authenticity token.
//!
//! After the last step the session's cookie jar holds an authenticated session.

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderName, REFERER};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::session::{Session, SessionRequest};
use crate::{BlinkpressError, Result};

const LANDING_PATH: &str = "/en/books.html";
const SETUP_PATH: &str = "/api/mickey_mouse/setup";
const LIBRARY_PATH: &str = "/en/nc/library/";
const LOGIN_PATH: &str = "/en/nc/login/";

/// Opaque token scraped from page markup or returned by the setup endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Progress of the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    TokenObtained,
    Authenticated,
}

/// Drives the login flow over a shared [`Session`].
#[derive(Debug)]
pub struct Authenticator {
    session: Arc<Session>,
    state: AuthState,
}

impl Authenticator {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session, state: AuthState::Unauthenticated }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Runs the whole flow. Any failure leaves the authenticator unauthenticated.
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        self.state = AuthState::Unauthenticated;

        let html = self.fetch_login_page().await?;
        let csrf = extract_token(&html)?;
        let authenticity = self.exchange_token(&csrf).await?;
        self.state = AuthState::TokenObtained;

        self.login(credentials, &authenticity).await?;
        self.state = AuthState::Authenticated;
        info!(user = %credentials.username, "logged in");
        Ok(())
    }

    /// Retrieves the landing page that embeds the anti-forgery token.
    pub async fn fetch_login_page(&self) -> Result<String> {
        self.session.get_text(LANDING_PATH).await
    }

    /// Trades the page token for the login authenticity token.
    pub async fn exchange_token(&self, token: &AuthToken) -> Result<AuthToken> {
        let referer = self.session.url(LIBRARY_PATH)?;
        let request = SessionRequest::get(SETUP_PATH)
            .header(ACCEPT, "application/json")
            .header(REFERER, referer.as_str())
            .header(HeaderName::from_static("x-requested-with"), "XMLHttpRequest")
            .header(HeaderName::from_static("x-csrf-token"), token.as_str());

        let response = self.session.request(request).await?;
        let authenticity = parse_setup_response(&response.body)?;
        debug!("received authenticity token");
        Ok(authenticity)
    }

    /// Posts the login form.
    ///
    /// Fails with [`BlinkpressError::AuthError`] when the site answers with a
    /// non-success status or sends the browser back to the login page.
    pub async fn login(&self, credentials: &Credentials, token: &AuthToken) -> Result<()> {
        let request = SessionRequest::post(LOGIN_PATH)
            .form([
                ("login[email]", credentials.username.as_str()),
                ("login[password]", credentials.password.as_str()),
                ("login[facebook_access_token]", ""),
                ("authenticity_token", token.as_str()),
            ])
            .require_success(false);

        let response = self.session.request(request).await?;

        if !response.status.is_success() {
            return Err(BlinkpressError::AuthError(format!(
                "login rejected with HTTP {}",
                response.status.as_u16()
            )));
        }

        if response.url.path().trim_end_matches('/') == LOGIN_PATH.trim_end_matches('/') {
            return Err(BlinkpressError::AuthError(
                "credentials rejected, still on the login page".to_string(),
            ));
        }

        Ok(())
    }
}

/// Returns the `content` of the page's `<meta name="csrf-token">` tag.
pub fn extract_token(html: &str) -> Result<AuthToken> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="csrf-token"]"#)
        .map_err(|e| BlinkpressError::ParseError(format!("Invalid selector: {}", e)))?;

    document
        .select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .filter(|content| !content.is_empty())
        .map(AuthToken::new)
        .ok_or_else(|| BlinkpressError::ParseError("csrf-token meta tag not found on landing page".to_string()))
}

/// Reads `authenticate.login.params.authenticity_token` from the setup response.
pub fn parse_setup_response(body: &str) -> Result<AuthToken> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| BlinkpressError::ParseError(format!("setup response is not JSON: {}", e)))?;

    json.pointer("/authenticate/login/params/authenticity_token")
        .and_then(Value::as_str)
        .map(AuthToken::new)
        .ok_or_else(|| {
            BlinkpressError::ParseError("authenticate.login.params.authenticity_token missing".to_string())
        })
}
