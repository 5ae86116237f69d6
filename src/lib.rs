pub mod app;
pub mod auth;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod messages;
pub mod models;
pub mod notifications;
pub mod prediction;
pub mod session;
pub mod view_state;

use tracing_subscriber::EnvFilter;

pub use app::{App, Page, Screen};
pub use backend::{BackendError, ClinicBackend, HttpBackend, ImageUpload, MockBackend};
pub use config::ClientConfig;
pub use session::{Identity, Session};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Calling it twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} client core v{}", config::APP_NAME, config::APP_VERSION);
}
