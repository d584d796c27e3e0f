use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable holding the log filter, e.g. `SENSMAP_LOG=sensmap_core=debug`.
pub const LOG_ENV: &str = "SENSMAP_LOG";

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Install the global fmt subscriber writing to stderr. Later calls are no-ops.
pub fn init_tracing() {
    if INITIALISED.set(()).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    if Registry::default().with(filter).with(fmt_layer).try_init().is_err() {
        tracing::warn!("a global tracing subscriber was already installed");
    }
}
