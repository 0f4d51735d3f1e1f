//! Session store: the single source of truth for "who is logged in".
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──check──▶ Checking ──▶ Authenticated
//!                                  └──▶ Anonymous
//! Authenticated ──logout / 401──▶ Anonymous
//! Anonymous ──login / register──▶ Authenticated
//! ```
//!
//! Nothing ever returns to `Uninitialized`. State lives in a
//! [`tokio::sync::watch`] channel so frontends can subscribe to changes; the
//! gateway keeps only a weak handle and therefore never touches a session
//! whose store has been dropped.

use std::sync::{Arc, Weak};

use serde_json::Value;
use tokio::sync::watch;

use crate::error::{GatewayError, Result};
use crate::gateway::{GatewayBuilder, HttpGateway};
use crate::navigation::Notice;
use crate::types::{Credentials, RegisterRequest, UserIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Checking,
    Authenticated,
    Anonymous,
}

/// Snapshot of the client-side session.
///
/// The authenticated flag is derived from the phase, and only the
/// `Authenticated` phase carries a user, so an authenticated session always
/// has an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    phase: SessionPhase,
    user: Option<UserIdentity>,
    loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            user: None,
            loading: true,
        }
    }
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True once the session state is known (checked, logged in or out).
    pub fn is_initialized(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Authenticated | SessionPhase::Anonymous
        )
    }

    fn begin_check(&mut self) {
        self.loading = true;
        if self.phase == SessionPhase::Uninitialized {
            self.phase = SessionPhase::Checking;
        }
    }

    fn authenticate(&mut self, user: UserIdentity) {
        self.phase = SessionPhase::Authenticated;
        self.user = Some(user);
    }

    pub(crate) fn clear(&mut self) {
        self.phase = SessionPhase::Anonymous;
        self.user = None;
    }
}

/// Shared owner of the session state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Session>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Applies `f`, waking subscribers only if the session changed.
    pub fn update(&self, f: impl FnOnce(&mut Session)) {
        self.tx.send_if_modified(|session| {
            let before = session.clone();
            f(session);
            *session != before
        });
    }

    pub(crate) fn downgrade(&self) -> WeakSession {
        WeakSession(Arc::downgrade(&self.tx))
    }

    fn loading(&self) -> LoadingGuard {
        self.update(|s| s.loading = true);
        LoadingGuard {
            handle: self.clone(),
        }
    }
}

/// Non-owning session reference held by the gateway.
#[derive(Debug, Clone)]
pub(crate) struct WeakSession(Weak<watch::Sender<Session>>);

impl WeakSession {
    pub(crate) fn upgrade(&self) -> Option<SessionHandle> {
        self.0.upgrade().map(|tx| SessionHandle { tx })
    }
}

/// Resets `loading` when dropped, including when the owning future is cancelled.
struct LoadingGuard {
    handle: SessionHandle,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.handle.update(|s| s.loading = false);
    }
}

/// Owns the session and drives it through the gateway.
pub struct SessionStore {
    gateway: Arc<HttpGateway>,
    session: SessionHandle,
}

impl SessionStore {
    /// `gateway` should have been built with `session` attached so that 401
    /// responses reset it.
    pub fn new(gateway: Arc<HttpGateway>, session: SessionHandle) -> Self {
        Self { gateway, session }
    }

    /// Builds the gateway with a fresh session attached.
    pub fn connect(builder: GatewayBuilder) -> Result<Self> {
        let session = SessionHandle::new();
        let gateway = builder.session(&session).build()?;
        Ok(Self::new(Arc::new(gateway), session))
    }

    pub fn gateway(&self) -> &Arc<HttpGateway> {
        &self.gateway
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.session
    }

    pub fn snapshot(&self) -> Session {
        self.session.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.tx.borrow().is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.session.tx.borrow().user().cloned()
    }

    /// Resolves the session against the backend.
    ///
    /// Without a persisted marker no request is made. Never fails: every
    /// failure resolves to anonymous and drops the marker.
    pub async fn check_session(&self) -> Session {
        {
            self.session.update(Session::begin_check);
            let _loading = self.session.loading();

            if self.gateway.has_marker() {
                self.resolve_identity().await;
            } else {
                tracing::debug!("No persisted marker; skipping session check");
                self.gateway.discard_marker();
                self.session.update(Session::clear);
            }
        }
        self.snapshot()
    }

    async fn resolve_identity(&self) {
        let path = self.gateway.config().identity_path().to_string();
        let user = match self.gateway.get(&path).await {
            Ok(body) => UserIdentity::from_response(&body),
            Err(e) => {
                tracing::info!(error = %e, "Session check failed");
                None
            }
        };

        match user {
            Some(user) => {
                tracing::info!(user_id = ?user.id(), "Session restored");
                self.session.update(|s| s.authenticate(user));
            }
            None => {
                self.gateway.discard_marker();
                self.session.update(Session::clear);
            }
        }
    }

    /// Logs in and navigates to the landing view.
    ///
    /// Returns the raw response body. Errors are returned unchanged and leave
    /// the session anonymous.
    pub async fn login(&self, credentials: &Credentials) -> Result<Value> {
        let _loading = self.session.loading();
        tracing::debug!(email = %credentials.email, "Logging in");

        let outcome = match self.gateway.login(credentials).await {
            Ok(body) => self.establish(&body).map(|()| body),
            Err(e) => Err(e),
        };

        if outcome.is_err() {
            self.session.update(Session::clear);
        }
        outcome
    }

    /// Registers an account.
    ///
    /// When the backend logs the new account in straight away (identity, and a
    /// token in bearer mode) the session becomes authenticated as after
    /// [`Self::login`]. Otherwise the session is left as it was.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value> {
        let _loading = self.session.loading();
        let body = self.gateway.register(request).await?;

        if self.gateway.can_establish(&body) {
            self.establish(&body)?;
        } else {
            tracing::info!(email = %request.email, "Registered; awaiting login");
        }
        Ok(body)
    }

    fn establish(&self, body: &Value) -> Result<()> {
        let Some(user) = UserIdentity::from_response(body) else {
            let err = GatewayError::decode("login response carries no user");
            self.gateway.notify(Notice::error(err.user_message()));
            return Err(err);
        };
        if let Err(e) = self.gateway.persist_login(body) {
            self.gateway.notify(Notice::error(e.user_message()));
            return Err(e);
        }

        tracing::info!(user_id = ?user.id(), "Logged in");
        self.session.update(|s| s.authenticate(user));
        let landing = self.gateway.config().landing_path.clone();
        self.gateway.navigate(&landing);
        Ok(())
    }

    /// Logs out. Always ends anonymous on the login view.
    ///
    /// A backend failure is still returned after the local session has been
    /// cleared.
    pub async fn logout(&self) -> Result<()> {
        let _loading = self.session.loading();

        let outcome = if self.gateway.has_marker() || self.is_authenticated() {
            self.gateway.logout().await.map(|_| ())
        } else {
            Ok(())
        };

        self.gateway.discard_marker();
        self.session.update(Session::clear);

        match &outcome {
            Ok(()) => self.gateway.notify(Notice::success("Logged out")),
            Err(e) => {
                tracing::warn!(error = %e, "Backend logout failed; local session cleared");
            }
        }
        // The gateway already redirected on 401.
        if !matches!(&outcome, Err(e) if e.is_unauthorized()) {
            let login = self.gateway.config().login_path.clone();
            self.gateway.navigate(&login);
        }
        outcome
    }
}
