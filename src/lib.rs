//! Privileged launcher for the FitsStorage upload ingest script.
//! The `invoke` binary is a thin wrapper around `launch::sanitize` and
//! `launch::launch`.

#![cfg(unix)]

pub mod config;
pub use config::{LaunchConfig, COMPILED};

mod err;
pub use err::*;

pub mod environ;
pub use environ::Environment;

pub mod identity;
pub use identity::Identity;

pub mod launch;
pub use launch::{Invocation, OsSystem, Prepared, Stage, System};

pub mod log;
