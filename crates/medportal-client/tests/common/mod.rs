//! Shared fixtures for the gateway and session integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use medportal_client::{
    AuthMode, ClientConfig, HttpGateway, MarkerStore, MemoryMarkerStore, PortalApi,
    RecordingNavigator, RecordingNotifier, SessionStore,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct Harness {
    pub server: MockServer,
    pub store: SessionStore,
    pub markers: Arc<MemoryMarkerStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub async fn start(mode: AuthMode) -> Self {
        let server = MockServer::start().await;
        Self::with_server(server, mode)
    }

    pub fn with_server(server: MockServer, mode: AuthMode) -> Self {
        let config = ClientConfig::parse(&server.uri())
            .expect("mock server URI is a valid base URL")
            .with_auth_mode(mode);
        let markers = Arc::new(MemoryMarkerStore::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let store = SessionStore::connect(
            HttpGateway::builder(config)
                .marker_store(markers.clone())
                .navigator(navigator.clone())
                .notifier(notifier.clone()),
        )
        .expect("gateway builds");

        Self {
            server,
            store,
            markers,
            navigator,
            notifier,
        }
    }

    pub fn api(&self) -> PortalApi {
        PortalApi::new(self.store.gateway().clone())
    }

    pub fn set_marker(&self, key: &str, value: &str) {
        self.markers.set(key, value).expect("memory store never fails");
    }

    pub fn marker(&self, key: &str) -> Option<String> {
        self.markers.get(key).expect("memory store never fails")
    }
}

/// Answers the CSRF priming request with a fresh anti-forgery cookie.
pub async fn mount_csrf_cookie(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/sanctum/csrf-cookie"))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("Set-Cookie", "XSRF-TOKEN=csrf%3Dtoken; Path=/"),
        )
        .mount(server)
        .await;
}
