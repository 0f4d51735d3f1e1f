//! Credential attachment strategies.
//!
//! A deployment either sends a bearer token or relies on a session cookie
//! guarded by an anti-forgery token. Both sit behind [`CredentialStrategy`] and
//! the gateway picks one from [`AuthMode`] at construction time.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use url::Url;

use crate::config::AuthMode;
use crate::error::{GatewayError, Result};
use crate::storage::MarkerStore;

/// Marker key for the bearer deployment; the value is the token itself.
pub const TOKEN_KEY: &str = "token";

/// Marker key for the cookie deployment.
pub const AUTHENTICATED_KEY: &str = "authenticated";

pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Attaches credentials to requests and manages the persisted marker.
#[async_trait]
pub trait CredentialStrategy: Send + Sync {
    fn mode(&self) -> AuthMode;

    /// Storage key of the persisted marker.
    fn marker_key(&self) -> &'static str;

    /// Adds credentials to an outgoing request for `url`.
    fn attach(&self, request: RequestBuilder, url: &Url, store: &dyn MarkerStore)
    -> RequestBuilder;

    /// Whether state-changing calls must be preceded by [`Self::prime`].
    fn requires_priming(&self) -> bool {
        false
    }

    /// Fetches whatever the backend needs before a state-changing call.
    async fn prime(&self, _http: &Client, _csrf_url: &Url) -> Result<()> {
        Ok(())
    }

    /// Records a successful login response in the marker store.
    fn persist(&self, store: &dyn MarkerStore, login_body: &Value) -> Result<()>;

    /// Removes the marker, returning whether one was present.
    fn clear(&self, store: &dyn MarkerStore) -> Result<bool> {
        Ok(store.remove(self.marker_key())?)
    }

    fn has_marker(&self, store: &dyn MarkerStore) -> bool {
        store.contains(self.marker_key())
    }
}

/// `Authorization: Bearer <token>` with the token kept in the marker store.
#[derive(Debug, Default, Clone, Copy)]
pub struct BearerToken;

impl BearerToken {
    pub fn new() -> Self {
        Self
    }
}

/// Finds the access token in a login/register response.
pub fn token_from_response(body: &Value) -> Option<&str> {
    let scopes = [Some(body), body.get("data")];
    scopes
        .into_iter()
        .flatten()
        .flat_map(|scope| ["token", "access_token"].map(|key| scope.get(key)))
        .flatten()
        .filter_map(Value::as_str)
        .find(|token| !token.is_empty())
}

#[async_trait]
impl CredentialStrategy for BearerToken {
    fn mode(&self) -> AuthMode {
        AuthMode::Bearer
    }

    fn marker_key(&self) -> &'static str {
        TOKEN_KEY
    }

    fn attach(
        &self,
        request: RequestBuilder,
        _url: &Url,
        store: &dyn MarkerStore,
    ) -> RequestBuilder {
        match store.get(TOKEN_KEY) {
            Ok(Some(token)) => request.bearer_auth(token),
            Ok(None) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored token");
                request
            }
        }
    }

    fn persist(&self, store: &dyn MarkerStore, login_body: &Value) -> Result<()> {
        let token = token_from_response(login_body)
            .ok_or_else(|| GatewayError::decode("login response carries no token"))?;
        store.set(TOKEN_KEY, token)?;
        Ok(())
    }
}

/// Session cookie plus anti-forgery token read from the shared cookie jar.
#[derive(Debug, Clone)]
pub struct CookieCsrf {
    jar: Arc<Jar>,
}

impl CookieCsrf {
    /// `jar` must be the jar the gateway's HTTP client stores cookies in.
    pub fn new(jar: Arc<Jar>) -> Self {
        Self { jar }
    }

    /// Current anti-forgery token for `url`, URL-decoded.
    pub fn xsrf_token(&self, url: &Url) -> Option<String> {
        let header = self.jar.cookies(url)?;
        let header = header.to_str().ok()?;
        find_cookie(header, XSRF_COOKIE).map(decode_cookie_value)
    }
}

fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn decode_cookie_value(raw: &str) -> String {
    // A literal '+' is data here, not an encoded space.
    let escaped = raw.replace('+', "%2B");
    url::form_urlencoded::parse(format!("v={escaped}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| raw.to_string())
}

#[async_trait]
impl CredentialStrategy for CookieCsrf {
    fn mode(&self) -> AuthMode {
        AuthMode::Cookie
    }

    fn marker_key(&self) -> &'static str {
        AUTHENTICATED_KEY
    }

    fn attach(
        &self,
        request: RequestBuilder,
        url: &Url,
        _store: &dyn MarkerStore,
    ) -> RequestBuilder {
        match self.xsrf_token(url) {
            Some(token) => request.header(XSRF_HEADER, token),
            None => request,
        }
    }

    fn requires_priming(&self) -> bool {
        true
    }

    async fn prime(&self, http: &Client, csrf_url: &Url) -> Result<()> {
        tracing::debug!(url = %csrf_url, "Priming CSRF cookie");
        let resp = http
            .get(csrf_url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GatewayError::csrf_priming(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::csrf_priming(format!("HTTP {status}")));
        }
        if self.xsrf_token(csrf_url).is_none() {
            return Err(GatewayError::csrf_priming(format!(
                "response did not set {XSRF_COOKIE}"
            )));
        }
        Ok(())
    }

    fn persist(&self, store: &dyn MarkerStore, _login_body: &Value) -> Result<()> {
        store.set(AUTHENTICATED_KEY, "true")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryMarkerStore;
    use serde_json::json;

    #[test]
    fn test_token_from_response() {
        assert_eq!(token_from_response(&json!({"token": "t1"})), Some("t1"));
        assert_eq!(
            token_from_response(&json!({"data": {"access_token": "t2"}})),
            Some("t2")
        );
        assert_eq!(token_from_response(&json!({"token": ""})), None);
        assert_eq!(token_from_response(&json!({"user": {"id": 1}})), None);
    }

    #[test]
    fn test_bearer_persist_and_clear() {
        let store = MemoryMarkerStore::new();
        let strategy = BearerToken::new();

        strategy
            .persist(&store, &json!({"token": "abc", "user": {"id": 1}}))
            .unwrap();
        assert!(strategy.has_marker(&store));
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        assert!(strategy.clear(&store).unwrap());
        assert!(!strategy.has_marker(&store));
    }

    #[test]
    fn test_bearer_persist_without_token_fails() {
        let store = MemoryMarkerStore::new();
        let err = BearerToken::new()
            .persist(&store, &json!({"user": {"id": 1}}))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
        assert!(!store.contains(TOKEN_KEY));
    }

    #[test]
    fn test_cookie_persist_sets_flag() {
        let store = MemoryMarkerStore::new();
        let strategy = CookieCsrf::new(Arc::new(Jar::default()));
        strategy.persist(&store, &Value::Null).unwrap();
        assert_eq!(
            store.get(AUTHENTICATED_KEY).unwrap().as_deref(),
            Some("true")
        );
        assert!(strategy.requires_priming());
    }

    #[test]
    fn test_xsrf_token_is_decoded_from_jar() {
        let jar = Arc::new(Jar::default());
        let url = Url::parse("https://portal.test/api/login").unwrap();
        jar.add_cookie_str("XSRF-TOKEN=eyJpdiI6%2Bab%3D%3D; Path=/", &url);
        jar.add_cookie_str("laravel_session=xyz; Path=/", &url);

        let strategy = CookieCsrf::new(jar);
        assert_eq!(strategy.xsrf_token(&url).as_deref(), Some("eyJpdiI6+ab=="));
    }

    #[test]
    fn test_find_cookie() {
        let header = "laravel_session=xyz; XSRF-TOKEN=abc";
        assert_eq!(find_cookie(header, "XSRF-TOKEN"), Some("abc"));
        assert_eq!(find_cookie(header, "missing"), None);
    }
}
