//! Real/effective identity handling.
//!
//! A setuid binary starts with real != effective.  Before the script
//! runs we make the effective identity the only one, and we check that
//! this actually happened rather than trusting the syscall.

use nix::unistd::{getegid, geteuid, getgid, getuid, Gid, Uid};

use crate::err::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub real_uid:      Uid,
    pub effective_uid: Uid,
    pub real_gid:      Gid,
    pub effective_gid: Gid,
}

impl Identity {
    pub fn current() -> Identity {
        Identity {
            real_uid:      getuid(),
            effective_uid: geteuid(),
            real_gid:      getgid(),
            effective_gid: getegid(),
        }
    }

    /// True if the process is running with borrowed privilege.
    pub fn is_split(&self) -> bool {
        self.real_uid != self.effective_uid || self.real_gid != self.effective_gid
    }
}

/// Set real, effective and (where the OS has one we can reach) saved
/// ids to the current effective ids, then read them back.  Returns the
/// identity observed before the change.
pub fn normalize() -> Result<Identity, LaunchError> {
    let before = Identity::current();
    set_all(before.effective_uid, before.effective_gid)?;
    verify(before.effective_uid, before.effective_gid)?;
    Ok(before)
}

#[cfg(any(target_os = "linux", target_os = "android",
          target_os = "freebsd", target_os = "dragonfly",
          target_os = "openbsd"))]
fn set_all(uid: Uid, gid: Gid) -> Result<(), LaunchError> {
    use nix::unistd::{setresgid, setresuid};

    // Group first: dropping a privileged uid first could leave us
    // unable to change the gid.
    setresgid(gid, gid, gid)
        .map_err(|e| map_identity_err(e, format!("setresgid({})", gid)))?;
    setresuid(uid, uid, uid)
        .map_err(|e| map_identity_err(e, format!("setresuid({})", uid)))
}

#[cfg(any(target_os = "linux", target_os = "android",
          target_os = "freebsd", target_os = "dragonfly",
          target_os = "openbsd"))]
fn verify(uid: Uid, gid: Gid) -> Result<(), LaunchError> {
    use nix::unistd::{getresgid, getresuid};

    let u = getresuid().map_err(|e| map_identity_err(e, String::from("getresuid")))?;
    let g = getresgid().map_err(|e| map_identity_err(e, String::from("getresgid")))?;
    if u.real != uid || u.effective != uid || u.saved != uid {
        return Err(LaunchError::IdentityMismatch {
            detail: format!("uids are {}/{}/{}, wanted {}",
                            u.real, u.effective, u.saved, uid)
        });
    }
    if g.real != gid || g.effective != gid || g.saved != gid {
        return Err(LaunchError::IdentityMismatch {
            detail: format!("gids are {}/{}/{}, wanted {}",
                            g.real, g.effective, g.saved, gid)
        });
    }
    Ok(())
}

// No setresuid(2) here; setreuid(2) also resets the saved id when the
// real id is set.
#[cfg(not(any(target_os = "linux", target_os = "android",
              target_os = "freebsd", target_os = "dragonfly",
              target_os = "openbsd")))]
fn set_all(uid: Uid, gid: Gid) -> Result<(), LaunchError> {
    use nix::errno::Errno;

    Errno::result(unsafe { libc::setregid(gid.as_raw(), gid.as_raw()) })
        .map_err(|e| map_identity_err(e, format!("setregid({})", gid)))?;
    Errno::result(unsafe { libc::setreuid(uid.as_raw(), uid.as_raw()) })
        .map(|_| ())
        .map_err(|e| map_identity_err(e, format!("setreuid({})", uid)))
}

#[cfg(not(any(target_os = "linux", target_os = "android",
              target_os = "freebsd", target_os = "dragonfly",
              target_os = "openbsd")))]
fn verify(uid: Uid, gid: Gid) -> Result<(), LaunchError> {
    let now = Identity::current();
    if now.real_uid != uid || now.effective_uid != uid
        || now.real_gid != gid || now.effective_gid != gid {
        return Err(LaunchError::IdentityMismatch {
            detail: format!("ids are {:?}, wanted uid {} gid {}", now, uid, gid)
        });
    }
    Ok(())
}
