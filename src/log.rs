//! Diagnostic trace output.
//!
//! The level is fixed when the binary is built.  `RUST_LOG` and friends
//! are never consulted: by the time this runs the caller's environment
//! is gone, and a setuid program should not take hints from it anyway.

use std::io;

use tracing::level_filters::LevelFilter;

#[cfg(not(feature = "trace"))]
pub const MAX_LEVEL: LevelFilter = LevelFilter::WARN;

#[cfg(feature = "trace")]
pub const MAX_LEVEL: LevelFilter = LevelFilter::DEBUG;

/// Install the stderr subscriber.  Call after the environment wipe.
pub fn init() {
    // Fails only if a subscriber is already installed, which is fine.
    let _ = tracing_subscriber::fmt()
        .with_max_level(MAX_LEVEL)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
