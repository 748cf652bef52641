//! Logging for adc-bus.
//!
//! Library code never looks up a global logger. Each reader and bus lock is
//! handed a [`DeviceLogger`]: a `tracing` dispatcher plus a span that carries the
//! device identity, so every event it emits names the device it belongs to.
//!
//! The binary installs the process-wide subscriber once through [`init`].

use std::sync::Arc;
use tracing::{Dispatch, Span};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

/// Log handle bound to one device identity.
#[derive(Clone, Debug)]
pub struct DeviceLogger {
    device: Arc<str>,
    dispatch: Dispatch,
    span: Span,
}

impl DeviceLogger {
    /// Bind `device` to an explicit dispatcher.
    pub fn new(device: impl Into<String>, dispatch: Dispatch) -> Self {
        let device: Arc<str> = Arc::from(device.into());
        let span = tracing::dispatcher::with_default(&dispatch, || {
            tracing::info_span!("device", id = %device)
        });
        Self {
            device,
            dispatch,
            span,
        }
    }

    /// Bind `device` to whatever dispatcher is current for this thread.
    pub fn current(device: impl Into<String>) -> Self {
        let dispatch = tracing::dispatcher::get_default(|dispatch| dispatch.clone());
        Self::new(device, dispatch)
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Run `f` with this logger's dispatcher and device span active.
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        tracing::dispatcher::with_default(&self.dispatch, || self.span.in_scope(f))
    }
}

/// Install the process-wide subscriber.
///
/// Logs go to stderr so that sample output on stdout stays machine readable.
/// The level is taken from `RUST_LOG`, defaulting to INFO.
pub fn init() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    // A second init (e.g. from an embedding process) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
