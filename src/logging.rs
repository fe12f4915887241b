//! Internal logging bootstrap for geoknn.
//!
//! Enabled only under the `setup_tracing` feature. When present, this module installs a
//! `tracing_subscriber` at load time if the `GEOKNN_DEBUG` environment variable is set to
//! anything other than `"0"`, `"false"`, or empty.

#[cfg(feature = "setup_tracing")]
use ctor::ctor;
#[cfg(feature = "setup_tracing")]
use tracing::Level;

#[cfg(feature = "setup_tracing")]
#[ctor]
fn set_debug_level() {
    if std::env::var("GEOKNN_DEBUG").map_or(true, |v| v == "0" || v == "false" || v.is_empty()) {
        // Leave the default no-op subscriber in place; tracing macros become no-ops.
    } else {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .init();
    }
}
