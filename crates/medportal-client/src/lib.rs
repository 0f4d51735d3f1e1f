//! Session lifecycle and HTTP gateway for the MedPortal backend.
//!
//! This crate provides the authentication core shared by every MedPortal
//! frontend:
//! - A [`SessionStore`] that owns the current user and authentication phase
//! - An [`HttpGateway`] through which every backend call passes
//! - Two interchangeable [`CredentialStrategy`] implementations (bearer token
//!   and cookie + CSRF) selected by [`AuthMode`]
//! - Injected [`Navigator`] and [`Notifier`] capabilities so frontends decide
//!   how redirects and user-visible messages are rendered
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────────────────────────┐
//! │  PortalApi   │────▶│               HttpGateway                │
//! └──────────────┘     │  ┌────────────────┐   ┌───────────────┐  │
//! ┌──────────────┐     │  │ Credential     │   │ MarkerStore   │  │
//! │ SessionStore │────▶│  │ Strategy       │   │ (token/flag)  │  │
//! └──────┬───────┘     │  └────────────────┘   └───────────────┘  │
//!        │             │  on 401: clear marker, reset session,    │
//!        │             │          notify, navigate to login       │
//!        ▼             └──────────────────────────────────────────┘
//!   watch::Sender<Session>  ◀──── weak handle held by the gateway
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use medportal_client::{ClientConfig, Credentials, HttpGateway, MemoryMarkerStore, SessionStore};
//!
//! let config = ClientConfig::new("https://portal.example.com/api".parse()?);
//! let store = SessionStore::connect(
//!     HttpGateway::builder(config).marker_store(Arc::new(MemoryMarkerStore::new())),
//! )?;
//!
//! store.check_session().await;
//! if !store.is_authenticated() {
//!     store.login(&Credentials::new("doc@example.com", "secret")).await?;
//! }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod types;

pub use api::{DoctorFilter, DoctorRecord, PortalApi, filter_doctors};
pub use config::{AuthMode, ClientConfig, ConfigError};
pub use credentials::{BearerToken, CookieCsrf, CredentialStrategy};
pub use error::{ErrorCategory, GatewayError, Result};
pub use gateway::{GatewayBuilder, HttpGateway};
pub use navigation::{
    LogNavigator, LogNotifier, Navigator, Notice, NoticeLevel, Notifier, RecordingNavigator,
    RecordingNotifier,
};
pub use session::{Session, SessionHandle, SessionPhase, SessionStore};
pub use storage::{FileMarkerStore, MarkerStore, MemoryMarkerStore, StorageError};
pub use types::{Credentials, RegisterRequest, UserIdentity};
