//! HTTP gateway: the single chokepoint for backend calls.
//!
//! Every request goes through [`HttpGateway::send`], which
//! 1. primes the CSRF cookie before state-changing calls (cookie deployment),
//! 2. attaches credentials through the configured [`CredentialStrategy`],
//! 3. inspects the response: a 401 clears the marker and the session,
//!    redirects to the login view and notifies; other failures notify.
//!
//! Errors are always returned to the caller after those side effects. There
//! are no retries.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::config::{AuthMode, ClientConfig};
use crate::credentials::{BearerToken, CookieCsrf, CredentialStrategy, token_from_response};
use crate::error::{GENERIC_ERROR_MESSAGE, GatewayError, Result, SESSION_EXPIRED_MESSAGE};
use crate::navigation::{LogNavigator, LogNotifier, Navigator, Notice, Notifier};
use crate::session::{Session, SessionHandle, WeakSession};
use crate::storage::{MarkerStore, MemoryMarkerStore};
use crate::types::{Credentials, RegisterRequest, UserIdentity};

/// Builder for [`HttpGateway`].
pub struct GatewayBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn MarkerStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    session: Option<WeakSession>,
}

impl GatewayBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            store: None,
            navigator: None,
            notifier: None,
            session: None,
        }
    }

    /// Defaults to an in-memory store.
    #[must_use]
    pub fn marker_store(mut self, store: Arc<dyn MarkerStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Defaults to [`LogNavigator`].
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Defaults to [`LogNotifier`].
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Session to reset on 401. Held weakly.
    #[must_use]
    pub fn session(mut self, session: &SessionHandle) -> Self {
        self.session = Some(session.downgrade());
        self
    }

    pub fn build(self) -> Result<HttpGateway> {
        self.config
            .validate()
            .map_err(|e| GatewayError::configuration(e.to_string()))?;

        let jar = Arc::new(Jar::default());
        let mut http = Client::builder().cookie_provider(Arc::clone(&jar));
        if let Some(timeout) = self.config.request_timeout() {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| GatewayError::configuration(format!("HTTP client: {e}")))?;

        let strategy: Arc<dyn CredentialStrategy> = match self.config.auth_mode {
            AuthMode::Bearer => Arc::new(BearerToken::new()),
            AuthMode::Cookie => Arc::new(CookieCsrf::new(jar)),
        };

        tracing::debug!(
            base_url = %self.config.base_url,
            auth_mode = %self.config.auth_mode,
            "Gateway configured"
        );

        Ok(HttpGateway {
            http,
            config: self.config,
            strategy,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryMarkerStore::new())),
            navigator: self.navigator.unwrap_or_else(|| Arc::new(LogNavigator)),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            session: self.session,
        })
    }
}

pub struct HttpGateway {
    http: Client,
    config: ClientConfig,
    strategy: Arc<dyn CredentialStrategy>,
    store: Arc<dyn MarkerStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    session: Option<WeakSession>,
}

impl HttpGateway {
    pub fn builder(config: ClientConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.strategy.mode()
    }

    pub fn marker_store(&self) -> &Arc<dyn MarkerStore> {
        &self.store
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        self.send(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        self.send(Method::PUT, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.send(Method::DELETE, path, None).await
    }

    /// `POST /login`
    pub async fn login(&self, credentials: &Credentials) -> Result<Value> {
        self.send_json(Method::POST, "/login", credentials).await
    }

    /// `POST /register`
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value> {
        self.send_json(Method::POST, "/register", request).await
    }

    /// `POST /logout`
    pub async fn logout(&self) -> Result<Value> {
        self.send(Method::POST, "/logout", None).await
    }

    /// `GET /user`
    pub async fn user(&self) -> Result<Value> {
        self.get("/user").await
    }

    /// `GET /auth/check`
    pub async fn auth_check(&self) -> Result<Value> {
        self.get("/auth/check").await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<Value> {
        let body = serde_json::to_value(body)
            .map_err(|e| self.fail(GatewayError::decode(e.to_string())))?;
        self.send(method, path, Some(&body)).await
    }

    /// Sends one request through the pipeline. Single attempt.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self
            .config
            .endpoint(path)
            .map_err(|e| self.fail(GatewayError::configuration(e.to_string())))?;

        if !method.is_safe() && self.strategy.requires_priming() {
            let csrf_url = self
                .config
                .endpoint(&self.config.csrf_path)
                .map_err(|e| self.fail(GatewayError::configuration(e.to_string())))?;
            self.strategy
                .prime(&self.http, &csrf_url)
                .await
                .map_err(|e| self.fail(e))?;
        }

        tracing::debug!(%method, %url, "Sending request");
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let request = self.strategy.attach(request, &url, self.store.as_ref());

        let resp = request
            .send()
            .await
            .map_err(|e| self.fail(GatewayError::network(e.to_string())))?;

        self.intercept(&method, resp).await
    }

    async fn intercept(&self, method: &Method, resp: Response) -> Result<Value> {
        let status = resp.status();
        let url = resp.url().clone();
        let body = resp
            .text()
            .await
            .map_err(|e| self.fail(GatewayError::network(e.to_string())))?;

        if status.is_success() {
            tracing::debug!(%method, %url, status = status.as_u16(), "Request succeeded");
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&body)
                .map_err(|e| self.fail(GatewayError::decode(e.to_string())));
        }

        let parsed = serde_json::from_str::<Value>(&body).ok();
        if status == StatusCode::UNAUTHORIZED {
            let message = parsed
                .as_ref()
                .and_then(crate::error::server_message)
                .unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string());
            return Err(self.expire_session(message));
        }

        Err(self.fail(GatewayError::from_body(
            status.as_u16(),
            parsed.as_ref(),
            GENERIC_ERROR_MESSAGE,
        )))
    }

    /// Handles a 401: marker, session, redirect, notice, in that order.
    fn expire_session(&self, message: String) -> GatewayError {
        tracing::warn!(%message, "Backend rejected credentials; clearing session");

        self.discard_marker();
        match self.session.as_ref().and_then(WeakSession::upgrade) {
            Some(session) => session.update(Session::clear),
            None => tracing::debug!("No live session to reset"),
        }
        self.navigator.navigate(&self.config.login_path);
        self.notifier.notify(Notice::error(message.clone()));

        GatewayError::unauthorized(message)
    }

    /// Logs and notifies a failure found after the response was accepted.
    pub fn reject(&self, err: GatewayError) -> GatewayError {
        self.fail(err)
    }

    fn fail(&self, err: GatewayError) -> GatewayError {
        tracing::warn!(error = %err, category = ?err.category(), "Request failed");
        self.notifier.notify(Notice::error(err.user_message()));
        err
    }

    pub fn has_marker(&self) -> bool {
        self.strategy.has_marker(self.store.as_ref())
    }

    /// Removes the persisted marker; storage failures are only logged.
    pub fn discard_marker(&self) {
        if let Err(e) = self.strategy.clear(self.store.as_ref()) {
            tracing::warn!(error = %e, "Failed to clear persisted marker");
        }
    }

    pub fn persist_login(&self, body: &Value) -> Result<()> {
        self.strategy.persist(self.store.as_ref(), body)
    }

    /// Whether a register/login response is enough to start a session.
    pub fn can_establish(&self, body: &Value) -> bool {
        UserIdentity::from_response(body).is_some()
            && match self.strategy.mode() {
                AuthMode::Bearer => token_from_response(body).is_some(),
                AuthMode::Cookie => true,
            }
    }

    pub fn navigate(&self, path: &str) {
        self.navigator.navigate(path);
    }

    pub fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }
}
