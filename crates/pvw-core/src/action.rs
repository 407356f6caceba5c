//! Process termination.
//!
//! Termination is a single SIGTERM. Success means the signal was delivered;
//! the follow-up refresh shows whether the process actually exited.

use pvw_common::ActionError;
use tracing::{info, warn};

/// Something that can ask a process to exit.
pub trait Terminator: Send + Sync {
    fn terminate(&self, pid: u32) -> Result<(), ActionError>;
}

/// Sends SIGTERM with `kill(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalTerminator;

impl SignalTerminator {
    pub fn new() -> Self {
        Self
    }
}

impl Terminator for SignalTerminator {
    #[cfg(unix)]
    fn terminate(&self, pid: u32) -> Result<(), ActionError> {
        // Zero or values past i32::MAX would address process groups.
        let target = match i32::try_from(pid) {
            Ok(target) if target > 0 => target,
            _ => {
                return Err(ActionError::Failed {
                    pid,
                    reason: "invalid pid".to_string(),
                })
            }
        };

        let result = unsafe { libc::kill(target, libc::SIGTERM) };
        if result == 0 {
            info!(target: "pvw.action", pid, "sent SIGTERM");
            return Ok(());
        }

        let err = std::io::Error::last_os_error();
        warn!(target: "pvw.action", pid, error = %err, "SIGTERM failed");
        match err.raw_os_error() {
            Some(libc::ESRCH) => Err(ActionError::NotFound { pid }),
            Some(libc::EPERM) => Err(ActionError::PermissionDenied { pid }),
            _ => Err(ActionError::Failed {
                pid,
                reason: err.to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&self, _pid: u32) -> Result<(), ActionError> {
        Err(ActionError::Unsupported)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::{Duration, Instant};

    #[test]
    fn terminates_a_child_process() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        SignalTerminator::new().terminate(child.id()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if child.try_wait().unwrap().is_some() {
                break;
            }
            assert!(Instant::now() < deadline, "child survived SIGTERM");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn reaped_process_is_not_found() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        let err = SignalTerminator::new().terminate(pid).unwrap_err();
        assert_eq!(err, ActionError::NotFound { pid });
    }

    #[test]
    fn zero_pid_is_rejected() {
        let err = SignalTerminator::new().terminate(0).unwrap_err();
        assert!(matches!(err, ActionError::Failed { pid: 0, .. }));
    }
}
