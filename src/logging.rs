// Tracing subscriber setup

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Directives used when `RUST_LOG` is not set: our crate at INFO,
/// the windowing and rendering stack only when it warns.
const DEFAULT_DIRECTIVES: &str = "warn,wininfo_app=info,eframe=warn,egui_glow=warn,winit=warn";

/// Installs the global subscriber. Safe to call once at startup.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true);

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
    {
        eprintln!("wininfo: failed to initialize logging: {e}");
    }
}
