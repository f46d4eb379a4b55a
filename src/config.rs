//! Compile-time launch configuration.
//!
//! Nothing here can be changed at run time.  Which profile is compiled
//! in is decided by cargo feature: the default is the system Python,
//! `conda` selects the Anaconda environment the archive hosts also run.

use crate::err::*;

/// The one privileged action this program can perform: run a permitted
/// script under `interpreter`, in an environment containing only `env`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub interpreter: &'static str,
    pub scripts:     &'static [&'static str],
    pub env:         &'static [(&'static str, &'static str)],
}

const INGEST_SCRIPT: &str = "/opt/FitsStorage/scripts/ingest_uploaded_file.py";

pub const SYSTEM_PYTHON: LaunchConfig = LaunchConfig {
    interpreter: "/usr/bin/python",
    scripts:     &[INGEST_SCRIPT],
    env:         &[("PYTHONPATH", "/opt/FitsStorage")],
};

pub const CONDA_PYTHON: LaunchConfig = LaunchConfig {
    interpreter: "/opt/anaconda3/envs/fitsstorage/bin/python",
    scripts:     &[INGEST_SCRIPT],
    env:         &[("PYTHONPATH",        "/opt/FitsStorage"),
                   ("CONDA_DEFAULT_ENV", "fitsstorage"),
                   ("CONDA_PREFIX",      "/opt/anaconda3/envs/fitsstorage")],
};

#[cfg(not(feature = "conda"))]
pub const COMPILED: LaunchConfig = SYSTEM_PYTHON;

#[cfg(feature = "conda")]
pub const COMPILED: LaunchConfig = CONDA_PYTHON;

fn valid_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl LaunchConfig {
    /// True if `candidate` is exactly one of the permitted script paths.
    /// Byte comparison only: no trimming, no case folding, no symlink
    /// resolution.
    pub fn permits(&self, candidate: &[u8]) -> bool {
        self.scripts.iter().any(|s| s.as_bytes() == candidate)
    }

    /// Check the invariants every profile must satisfy.  The binary
    /// refuses to run a profile that fails this.
    pub fn validate(&self) -> Result<(), LaunchError> {
        if !self.interpreter.starts_with('/') || self.interpreter.contains('\0') {
            return Err(LaunchError::BadConfig(
                format!("interpreter {:?} is not an absolute path",
                        self.interpreter)));
        }
        if self.scripts.is_empty() {
            return Err(LaunchError::BadConfig(
                String::from("no permitted scripts")));
        }
        for s in self.scripts {
            if !s.starts_with('/') || s.contains('\0') {
                return Err(LaunchError::BadConfig(
                    format!("script {:?} is not an absolute path", s)));
            }
        }
        for (i, &(name, value)) in self.env.iter().enumerate() {
            if !valid_env_name(name) {
                return Err(LaunchError::BadConfig(
                    format!("invalid environment variable name {:?}", name)));
            }
            if value.contains('\0') {
                return Err(LaunchError::BadConfig(
                    format!("value of {} contains NUL", name)));
            }
            if self.env[..i].iter().any(|&(prev, _)| prev == name) {
                return Err(LaunchError::BadConfig(
                    format!("{} listed twice", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shipped_profiles_are_valid() {
        SYSTEM_PYTHON.validate().unwrap();
        CONDA_PYTHON.validate().unwrap();
        COMPILED.validate().unwrap();
    }

    #[test]
    fn permits_only_the_exact_path() {
        let c = SYSTEM_PYTHON;
        assert!(c.permits(INGEST_SCRIPT.as_bytes()));
        for near_miss in &[
            "/opt/FitsStorage/scripts/ingest_uploaded_file.py/",
            "/opt/FitsStorage/scripts/ingest_uploaded_file.py ",
            " /opt/FitsStorage/scripts/ingest_uploaded_file.py",
            "/opt/fitsstorage/scripts/ingest_uploaded_file.py",
            "/opt/FitsStorage//scripts/ingest_uploaded_file.py",
            "/opt/FitsStorage/scripts/../scripts/ingest_uploaded_file.py",
            "scripts/ingest_uploaded_file.py",
            "ingest_uploaded_file.py",
            "",
        ] {
            assert!(!c.permits(near_miss.as_bytes()), "{:?}", near_miss);
        }
    }

    #[test]
    fn both_profiles_share_the_module_search_path() {
        assert_eq!(SYSTEM_PYTHON.env[0], ("PYTHONPATH", "/opt/FitsStorage"));
        assert_eq!(CONDA_PYTHON.env[0], ("PYTHONPATH", "/opt/FitsStorage"));
        assert_eq!(SYSTEM_PYTHON.scripts, CONDA_PYTHON.scripts);
    }

    #[test]
    fn validate_rejects_bad_profiles() {
        let relative = LaunchConfig { interpreter: "python", ..SYSTEM_PYTHON };
        assert!(relative.validate().is_err());

        let no_scripts = LaunchConfig { scripts: &[], ..SYSTEM_PYTHON };
        assert!(no_scripts.validate().is_err());

        let rel_script = LaunchConfig { scripts: &["x.py"], ..SYSTEM_PYTHON };
        assert!(rel_script.validate().is_err());

        let bad_name = LaunchConfig { env: &[("A=B", "c")], ..SYSTEM_PYTHON };
        assert!(bad_name.validate().is_err());

        let digit_name = LaunchConfig { env: &[("1A", "c")], ..SYSTEM_PYTHON };
        assert!(digit_name.validate().is_err());

        let dup = LaunchConfig { env: &[("A", "1"), ("A", "2")],
                                 ..SYSTEM_PYTHON };
        assert!(dup.validate().is_err());

        let nul = LaunchConfig { env: &[("A", "x\0y")], ..SYSTEM_PYTHON };
        assert!(nul.validate().is_err());
    }

    #[test]
    fn multiple_scripts_is_a_config_change() {
        let two = LaunchConfig { scripts: &["/a.py", "/b.py"],
                                 ..SYSTEM_PYTHON };
        two.validate().unwrap();
        assert!(two.permits(b"/a.py"));
        assert!(two.permits(b"/b.py"));
        assert!(!two.permits(b"/c.py"));
    }
}
