//! `libnova_native.so`: the JNI surface of the Nova host.
//!
//! Every entry point forwards to one process-wide [`Host`]. Errors never
//! cross into Java: they are logged and flattened into the values
//! `MainActivity` expects.

use std::sync::{
    OnceLock,
    atomic::{AtomicBool, Ordering},
};

use nova_runtime::{Host, HostError};

#[cfg(target_os = "android")]
mod android;

static HOST: OnceLock<Host> = OnceLock::new();

/// The host instance owned by this library.
pub fn host() -> &'static Host {
    HOST.get_or_init(Host::default)
}

/// `loadCore` contract: `None` on success, a diagnostic otherwise.
pub(crate) fn load_core_outcome(result: Result<(), HostError>) -> Option<String> {
    match result {
        Ok(()) => None,
        Err(e) => Some(e.to_string()),
    }
}

/// Logs a failed operation and reduces the outcome to a flag.
pub(crate) fn succeeded(op: &str, result: Result<(), HostError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("{op} failed: {e}");
            false
        }
    }
}

/// Remembers that a condition has fired so it is reported only once.
#[cfg_attr(not(target_os = "android"), allow(dead_code))]
#[derive(Default)]
pub(crate) struct Latch(AtomicBool);

#[cfg_attr(not(target_os = "android"), allow(dead_code))]
impl Latch {
    /// `true` only for the first call.
    pub(crate) fn trip(&self) -> bool {
        !self.0.swap(true, Ordering::Relaxed)
    }

    pub(crate) fn is_tripped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
