//! Error type and helper functions.

use thiserror::Error;

/// Everything that can stop the launcher short of replacing itself
/// with the interpreter.  The `Display` form is the one-line diagnostic
/// printed on stdout; none of the variants ever carry environment
/// contents.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Invoke called with no arguments")]
    NoArguments,

    #[error("Invoke called with invalid script: {0}")]
    InvalidScript(String),

    #[error("Invoke could not normalize identity: {detail}: {cause}")]
    Identity { cause: nix::Error, detail: String },

    #[error("Invoke could not normalize identity: {detail}")]
    IdentityMismatch { detail: String },

    #[error("Invoke could not reset signal mask: {detail}: {cause}")]
    Signals { cause: nix::Error, detail: String },

    #[error("Invoke could not execute {detail}: {cause}")]
    Exec { cause: nix::Error, detail: String },

    #[error("Invoke misconfigured: {0}")]
    BadConfig(String),
}

/// Exit codes.  2 and 3 are the caller's fault, 1 and 4 are not.
pub const EXIT_EXEC_FAILED:  i32 = 1;
pub const EXIT_USAGE:        i32 = 2;
pub const EXIT_UNAUTHORIZED: i32 = 3;
pub const EXIT_IDENTITY:     i32 = 4;

impl LaunchError {
    pub fn exit_code(&self) -> i32 {
        match *self {
            LaunchError::NoArguments            => EXIT_USAGE,
            LaunchError::InvalidScript(_)       => EXIT_UNAUTHORIZED,
            LaunchError::Identity { .. }        => EXIT_IDENTITY,
            LaunchError::IdentityMismatch { .. } => EXIT_IDENTITY,
            LaunchError::Signals { .. }         => EXIT_EXEC_FAILED,
            LaunchError::Exec { .. }            => EXIT_EXEC_FAILED,
            LaunchError::BadConfig(_)           => EXIT_EXEC_FAILED,
        }
    }
}

pub fn map_identity_err(cause: nix::Error, detail: String) -> LaunchError {
    LaunchError::Identity { cause, detail }
}
pub fn map_signal_err(cause: nix::Error, detail: String) -> LaunchError {
    LaunchError::Signals { cause, detail }
}
pub fn map_exec_err(cause: nix::Error, detail: String) -> LaunchError {
    LaunchError::Exec { cause, detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;
    use pretty_assertions::assert_eq;

    #[test]
    fn diagnostics_match_the_documented_lines() {
        assert_eq!(LaunchError::NoArguments.to_string(),
                   "Invoke called with no arguments");
        assert_eq!(LaunchError::InvalidScript(String::from("/tmp/evil.py"))
                   .to_string(),
                   "Invoke called with invalid script: /tmp/evil.py");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(LaunchError::NoArguments.exit_code(), 2);
        assert_eq!(LaunchError::InvalidScript(String::new()).exit_code(), 3);
        assert_eq!(map_exec_err(Errno::ENOENT, String::from("/x"))
                   .exit_code(), 1);
        assert_eq!(map_identity_err(Errno::EPERM, String::from("setresuid"))
                   .exit_code(), 4);
        assert_eq!(LaunchError::IdentityMismatch {
            detail: String::from("uid")
        }.exit_code(), 4);
        assert_eq!(map_signal_err(Errno::EINVAL, String::from("sigprocmask"))
                   .exit_code(), 1);
        assert_eq!(LaunchError::BadConfig(String::new()).exit_code(), 1);
    }

    #[test]
    fn exec_failure_reports_os_reason() {
        let e = map_exec_err(Errno::ENOENT, String::from("/usr/bin/python"));
        let msg = e.to_string();
        assert!(msg.contains("/usr/bin/python"), "{}", msg);
        assert!(msg.contains(Errno::ENOENT.desc()), "{}", msg);
    }
}
