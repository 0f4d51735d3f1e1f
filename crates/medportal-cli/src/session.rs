use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use medportal_client::{
    ClientConfig, FileMarkerStore, HttpGateway, Navigator, Notice, NoticeLevel, Notifier,
    SessionStore,
};

use crate::output::{print_error, print_success};

/// Turns gateway redirects into terminal hints.
pub struct TerminalNavigator {
    login_path: String,
}

impl TerminalNavigator {
    pub fn new(login_path: &str) -> Self {
        Self {
            login_path: login_path.to_string(),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        if path == self.login_path {
            eprintln!(
                "{} Signed out. Run {} to sign in again.",
                "→".yellow(),
                "medportal login".cyan()
            );
        } else {
            tracing::debug!(path, "navigate");
        }
    }
}

/// Prints notices as the gateway raises them.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => print_success(&notice.message),
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Error => print_error(&notice.message),
        }
    }
}

/// Session store for `profile`, persisting the marker next to the config.
pub fn open(config: ClientConfig, config_dir: &Path, profile: &str) -> Result<SessionStore> {
    let markers = Arc::new(FileMarkerStore::for_profile(config_dir, profile));
    let navigator = Arc::new(TerminalNavigator::new(&config.login_path));

    SessionStore::connect(
        HttpGateway::builder(config)
            .marker_store(markers)
            .navigator(navigator)
            .notifier(Arc::new(TerminalNotifier)),
    )
    .map_err(|e| anyhow::anyhow!("Failed to set up HTTP client: {e}"))
}

/// Resolves the stored session, failing when nobody is logged in.
pub async fn require(store: &SessionStore) -> Result<()> {
    let session = store.check_session().await;
    if !session.is_authenticated() {
        anyhow::bail!("Not logged in. Run: medportal login --email <email>");
    }
    Ok(())
}
