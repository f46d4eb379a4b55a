//! The environment handed to the interpreter.
//!
//! It is built only from the compiled-in allow-list, never from what
//! the caller passed us, and its size has nothing to do with the size
//! of the inherited block.

use std::ffi::CString;

use crate::config::LaunchConfig;
use crate::err::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    vars: Vec<CString>,
}

impl Environment {
    pub fn from_config(config: &LaunchConfig) -> Result<Environment, LaunchError> {
        let mut vars = Vec::with_capacity(config.env.len());
        for &(name, value) in config.env {
            let kv = CString::new(format!("{}={}", name, value))
                .map_err(|_| LaunchError::BadConfig(
                    format!("value of {} contains NUL", name)))?;
            vars.push(kv);
        }
        Ok(Environment { vars })
    }

    /// `NAME=value` entries, in allow-list order.
    pub fn entries(&self) -> &[CString] {
        &self.vars
    }

    /// Variable names only.  Safe to log; the values are not.
    pub fn names(&self) -> Vec<&str> {
        self.vars.iter()
            .filter_map(|kv| kv.to_str().ok())
            .filter_map(|kv| kv.split('=').next())
            .collect()
    }
}

/// Discard every inherited environment variable from this process.
/// Must be called while the process is still single-threaded.
#[cfg(target_os = "linux")]
pub fn wipe_inherited() {
    // clearenv() cannot fail on glibc or musl; it only ever
    // returns 0.
    unsafe {
        libc::clearenv();
    }
}

#[cfg(not(target_os = "linux"))]
pub fn wipe_inherited() {
    use std::env;

    let keys: Vec<_> = env::vars_os().map(|(k, _)| k).collect();
    for k in keys {
        env::remove_var(k);
    }
}
