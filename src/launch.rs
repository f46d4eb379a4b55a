//! The launcher proper: validate the invocation, then replace this
//! process with the interpreter.
//!
//! Everything that touches process-wide state goes through `System`,
//! so the sequencing can be tested without actually exec'ing.

use std::env;
use std::convert::Infallible;
use std::ffi::{CString, OsString};
use std::fmt;
use std::os::unix::ffi::OsStrExt;

use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, SigSet, Signal};
use nix::unistd::execve;
use tracing::{debug, warn};

use crate::config::LaunchConfig;
use crate::environ::{self, Environment};
use crate::err::*;
use crate::identity::{self, Identity};

/// Where the launcher has got to, as reported in trace events.  There
/// is no way back to an earlier stage; from any of them the only exits
/// are exec or failure, and neither is observable from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EnvSanitized,
    ArgsValidated,
    IdentityNormalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Stage::EnvSanitized       => "env-sanitized",
            Stage::ArgsValidated      => "args-validated",
            Stage::IdentityNormalized => "identity-normalized",
        })
    }
}

/// The command line exactly as the OS handed it to us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<OsString>,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Invocation
        where I: IntoIterator<Item = S>, S: Into<OsString>
    {
        Invocation { argv: argv.into_iter().map(Into::into).collect() }
    }

    pub fn from_os() -> Invocation {
        Invocation::new(env::args_os())
    }

    /// The argument count and target identity gates.  Only argv[1] is
    /// looked at.
    pub fn authorize(&self, config: &LaunchConfig) -> Result<(), LaunchError> {
        if self.argv.len() < 2 {
            return Err(LaunchError::NoArguments);
        }
        let script = &self.argv[1];
        if !config.permits(script.as_bytes()) {
            return Err(LaunchError::InvalidScript(
                script.to_string_lossy().into_owned()));
        }
        Ok(())
    }

    /// argv for the interpreter: slot 0 replaced by the interpreter
    /// path, every other slot passed through untouched.
    pub fn rewrite(&self, config: &LaunchConfig) -> Result<Vec<CString>, LaunchError> {
        let mut argv = Vec::with_capacity(self.argv.len().max(1));
        argv.push(interpreter_path(config)?);
        for (i, arg) in self.argv.iter().enumerate().skip(1) {
            let arg = CString::new(arg.as_bytes())
                .map_err(|_| map_exec_err(Errno::EINVAL,
                                          format!("argument {}", i)))?;
            argv.push(arg);
        }
        Ok(argv)
    }
}

fn interpreter_path(config: &LaunchConfig) -> Result<CString, LaunchError> {
    CString::new(config.interpreter)
        .map_err(|_| LaunchError::BadConfig(
            format!("interpreter {:?} contains NUL", config.interpreter)))
}

/// Everything `execve` needs, fully built before any privileged step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub interpreter: CString,
    pub argv:        Vec<CString>,
    pub env:         Environment,
}

/// Process-wide operations the launcher performs.  `OsSystem` does them
/// for real.
pub trait System {
    fn wipe_environment(&mut self);
    fn normalize_identity(&mut self) -> Result<Identity, LaunchError>;
    fn reset_signals(&mut self) -> Result<(), LaunchError>;
    /// Only returns on failure.
    fn exec(&mut self, prepared: &Prepared) -> LaunchError;
}

pub struct OsSystem;

impl System for OsSystem {
    fn wipe_environment(&mut self) {
        environ::wipe_inherited()
    }

    fn normalize_identity(&mut self) -> Result<Identity, LaunchError> {
        identity::normalize()
    }

    fn reset_signals(&mut self) -> Result<(), LaunchError> {
        reset_signals()
    }

    fn exec(&mut self, prepared: &Prepared) -> LaunchError {
        exec(prepared)
    }
}

/// Unblock everything and put every catchable signal back to its
/// default action.  Ignored dispositions survive execve, whether the
/// caller set them (nohup) or the Rust runtime did (SIGPIPE).
pub fn reset_signals() -> Result<(), LaunchError> {
    SigSet::empty().thread_set_mask()
        .map_err(|e| map_signal_err(e, String::from("sigprocmask")))?;
    for sig in Signal::iterator() {
        if sig == Signal::SIGKILL || sig == Signal::SIGSTOP {
            continue;
        }
        unsafe { signal(sig, SigHandler::SigDfl) }
            .map_err(|e| map_signal_err(e, format!("signal({:?})", sig)))?;
    }
    Ok(())
}

/// Replace this process image.  Returns only if that failed.
pub fn exec(prepared: &Prepared) -> LaunchError {
    match execve(&prepared.interpreter, &prepared.argv,
                 prepared.env.entries()) {
        Ok(never) => match never {},
        Err(e) => map_exec_err(e, prepared.interpreter
                               .to_string_lossy().into_owned()),
    }
}

/// Step 1: wipe the inherited environment and build the replacement.
/// Must run before anything else looks at the environment.
pub fn sanitize<S: System>(config: &LaunchConfig, system: &mut S)
                           -> Result<Environment, LaunchError> {
    system.wipe_environment();
    config.validate()?;
    Environment::from_config(config)
}

/// Steps 2 onward.  On success this never returns.
pub fn launch<S: System>(config: &LaunchConfig, env: Environment,
                         invocation: &Invocation, system: &mut S)
                         -> Result<Infallible, LaunchError> {
    debug!(stage = %Stage::EnvSanitized, vars = ?env.names());

    if let Err(e) = invocation.authorize(config) {
        warn!(stage = %Stage::EnvSanitized, "rejected: {}", e);
        return Err(e);
    }
    let prepared = Prepared {
        interpreter: interpreter_path(config)?,
        argv:        invocation.rewrite(config)?,
        env,
    };
    debug!(stage = %Stage::ArgsValidated, argc = prepared.argv.len());

    let before = system.normalize_identity()?;
    debug!(stage = %Stage::IdentityNormalized,
           was_split = before.is_split(),
           uid = %before.effective_uid, gid = %before.effective_gid);

    system.reset_signals()?;
    Err(system.exec(&prepared))
}

/// The whole launcher, start to finish.
pub fn run<S: System>(config: &LaunchConfig, invocation: &Invocation,
                      system: &mut S) -> Result<Infallible, LaunchError> {
    let env = sanitize(config, system)?;
    launch(config, env, invocation, system)
}
