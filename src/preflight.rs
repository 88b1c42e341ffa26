//! Start-up check of the external commands the sampler shells out to.
//!
//! Library dependencies are resolved by Cargo at build time; only programs
//! invoked at runtime are checked here, once, before the loop starts.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::system::hardware_port::NETWORKSETUP;
use crate::system::interfaces::ROUTE;
use crate::system::probe::PING;

/// An external program the monitor may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub program: &'static str,
    /// Missing required capabilities abort start-up; optional ones only warn
    pub required: bool,
    pub purpose: &'static str,
}

/// Capabilities needed for the given settings on this OS.
pub fn required_capabilities(probe_enabled: bool) -> Vec<Capability> {
    let mut caps = Vec::new();
    if probe_enabled {
        caps.push(Capability {
            program: PING,
            required: true,
            purpose: "reachability probe",
        });
    }
    if cfg!(target_os = "macos") {
        caps.push(Capability {
            program: NETWORKSETUP,
            required: false,
            purpose: "hardware port names",
        });
    }
    if cfg!(any(
        target_os = "macos",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    )) {
        caps.push(Capability {
            program: ROUTE,
            required: false,
            purpose: "default route interface",
        });
    }
    caps
}

/// Outcome of a successful check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preflight {
    pub found: Vec<(&'static str, PathBuf)>,
    pub missing_optional: Vec<&'static str>,
}

impl Preflight {
    pub fn has(&self, program: &str) -> bool {
        self.found.iter().any(|(p, _)| *p == program)
    }
}

/// Check every capability against `PATH`.
pub fn check(caps: &[Capability]) -> Result<Preflight> {
    check_with_path(caps, env::var_os("PATH"))
}

/// Same as [`check`] with an explicit search path.
pub fn check_with_path(caps: &[Capability], path_var: Option<OsString>) -> Result<Preflight> {
    let dirs: Vec<PathBuf> = path_var
        .map(|p| env::split_paths(&p).collect())
        .unwrap_or_default();

    let mut report = Preflight::default();
    for cap in caps {
        match locate(cap.program, &dirs) {
            Some(found) => {
                tracing::debug!(program = cap.program, path = %found.display(), "capability found");
                report.found.push((cap.program, found));
            }
            None if cap.required => return Err(Error::MissingCapability(cap.program)),
            None => {
                tracing::warn!(program = cap.program, purpose = cap.purpose, "optional command not found");
                report.missing_optional.push(cap.program);
            }
        }
    }
    Ok(report)
}

fn locate(program: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let as_path = Path::new(program);
    if as_path.is_absolute() {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }
    dirs.iter().find_map(|dir| {
        candidates(program)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    })
}

fn candidates(program: &str) -> Vec<String> {
    if cfg!(windows) {
        vec![format!("{program}.exe"), program.to_string()]
    } else {
        vec![program.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn fake_bin(dir: &Path, name: &str) {
        let file = if cfg!(windows) {
            format!("{name}.exe")
        } else {
            name.to_string()
        };
        File::create(dir.join(file)).unwrap();
    }

    #[test]
    fn reachability_needs_ping() {
        let caps = required_capabilities(true);
        assert!(caps.iter().any(|c| c.program == PING && c.required));
        assert!(required_capabilities(false).iter().all(|c| c.program != PING));
    }

    #[test]
    fn finds_program_on_search_path() {
        let dir = tempfile::tempdir().unwrap();
        fake_bin(dir.path(), "ping");

        let report = check_with_path(&required_capabilities(true), Some(dir.path().as_os_str().to_owned())).unwrap();
        assert!(report.has("ping"));
    }

    #[test]
    fn missing_required_program_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_with_path(&required_capabilities(true), Some(dir.path().as_os_str().to_owned())).unwrap_err();
        assert!(matches!(err, Error::MissingCapability("ping")));
    }

    #[test]
    fn route_is_optional_where_it_is_used() {
        let caps = required_capabilities(false);
        let route = caps.iter().find(|c| c.program == ROUTE);
        if cfg!(target_os = "macos") {
            assert!(route.is_some_and(|c| !c.required));
        }
        if cfg!(target_os = "linux") {
            assert!(route.is_none());
        }
    }

    #[test]
    fn absolute_program_path_ignores_search_path() {
        let dir = tempfile::tempdir().unwrap();
        fake_bin(dir.path(), "route");
        let program: &'static str = Box::leak(
            dir.path().join(if cfg!(windows) { "route.exe" } else { "route" })
                .display()
                .to_string()
                .into_boxed_str(),
        );
        let caps = [Capability {
            program,
            required: true,
            purpose: "test",
        }];
        assert!(check_with_path(&caps, None).unwrap().has(program));
    }

    #[test]
    fn missing_optional_program_is_reported() {
        let caps = [Capability {
            program: "definitely-not-installed",
            required: false,
            purpose: "test",
        }];
        let report = check_with_path(&caps, None).unwrap();
        assert_eq!(report.missing_optional, vec!["definitely-not-installed"]);
    }
}
