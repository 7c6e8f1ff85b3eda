//! Tracing subscriber setup for applications embedding the GUI
//!
//! The crate only emits `tracing` events; these helpers are a convenience for hosts
//! that do not install a subscriber of their own.

use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "dear_imgui_engine=info,warn";

/// Install a formatting subscriber honouring `RUST_LOG`, defaulting to info for this
/// crate and warn for everything else
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Install a formatting subscriber with an explicit filter such as
/// `"dear_imgui_engine=debug"`
pub fn init_tracing_with_filter(filter: &str) {
    install(EnvFilter::new(filter));
}

fn install(filter: EnvFilter) {
    let result = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
    if result.is_err() {
        tracing::debug!("A tracing subscriber is already installed");
    }
}
