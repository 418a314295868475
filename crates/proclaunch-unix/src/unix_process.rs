#[cfg(unix)]
mod unix_impl {
    use nix::errno::Errno;
    use nix::sys::signal;
    use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
    use nix::unistd::{Pid, getpid};
    use proclaunch_core::{
        ExitOutcome, ExitWaiter, LAUNCHER_ENV, Launcher, ProcessError, ProcessHandle, ProcessId,
        SpawnRequest,
    };
    use std::os::unix::process::CommandExt;
    use std::process::Command;
    use std::sync::{Arc, Mutex, PoisonError, TryLockError};
    use tracing::{debug, info, warn};

    /// Unix process handle wrapping an integer pid
    #[derive(Debug)]
    pub struct UnixProcess {
        pid: Pid,
        valid: bool,
        /// First termination observed through this handle; the kernel reports it only once
        outcome: Mutex<Option<ExitOutcome>>,
    }

    impl ProcessHandle for UnixProcess {
        type Native = Pid;

        const INVALID: Pid = Pid::from_raw(-1);

        fn from_native(pid: Pid) -> Self {
            // kill(2) with pid <= 0 addresses process groups, never probe those
            let valid = pid.as_raw() > 0
                && match signal::kill(pid, None) {
                    Ok(()) => true,
                    // Exists but belongs to another user
                    Err(Errno::EPERM) => true,
                    Err(_) => false,
                };
            Self {
                pid,
                valid,
                outcome: Mutex::new(None),
            }
        }

        fn from_pid(pid: ProcessId) -> Self {
            match i32::try_from(pid) {
                Ok(raw) => Self::from_native(Pid::from_raw(raw)),
                Err(_) => Self::invalid(),
            }
        }

        fn current() -> Arc<Self> {
            Arc::new(Self::from_native(getpid()))
        }

        fn is_valid(&self) -> bool {
            self.valid
        }

        fn native(&self) -> Pid {
            self.pid
        }

        fn pid(&self) -> Option<ProcessId> {
            self.valid.then(|| self.pid.as_raw() as ProcessId)
        }
    }

    fn decode(status: WaitStatus) -> Option<ExitOutcome> {
        match status {
            WaitStatus::Exited(_, code) => Some(ExitOutcome::Exited(code)),
            WaitStatus::Signaled(_, signal, core_dumped) => {
                debug!(signal = ?signal, core_dumped, "Process terminated by signal");
                Some(ExitOutcome::Abnormal)
            }
            // Stopped, continued and ptrace stops are not terminations
            _ => None,
        }
    }

    /// Exit waiter built on waitpid(2)
    ///
    /// The handle's outcome lock is held across `waitpid`, so concurrent waits
    /// on one handle queue behind the thread that reaps and all observe its
    /// result instead of racing to `ECHILD`.
    pub struct UnixExitWaiter;

    impl ExitWaiter for UnixExitWaiter {
        type Process = UnixProcess;

        fn blocking_exit_code(process: &UnixProcess) -> ExitOutcome {
            if !process.is_valid() {
                return ExitOutcome::WaitFailed;
            }
            let mut outcome = process.outcome.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(outcome) = *outcome {
                return outcome;
            }

            loop {
                match waitpid(process.native(), None) {
                    Ok(status) => {
                        if let Some(decoded) = decode(status) {
                            *outcome = Some(decoded);
                            return decoded;
                        }
                    }
                    Err(Errno::EINTR) => continue,
                    Err(e) => {
                        warn!(pid = %process.native(), error = %e, "waitpid failed");
                        return ExitOutcome::WaitFailed;
                    }
                }
            }
        }

        fn try_exit_code(process: &UnixProcess) -> Option<ExitOutcome> {
            if !process.is_valid() {
                return Some(ExitOutcome::WaitFailed);
            }
            let mut outcome = match process.outcome.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                // Another thread is blocked reaping; the process has not been observed to exit
                Err(TryLockError::WouldBlock) => return None,
            };
            if let Some(outcome) = *outcome {
                return Some(outcome);
            }

            match waitpid(process.native(), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => None,
                Ok(status) => {
                    let decoded = decode(status)?;
                    *outcome = Some(decoded);
                    Some(decoded)
                }
                Err(e) => {
                    warn!(pid = %process.native(), error = %e, "waitpid failed");
                    Some(ExitOutcome::WaitFailed)
                }
            }
        }
    }

    /// Launcher passing discrete argv entries to execve(2) verbatim
    pub struct UnixLauncher;

    impl Launcher for UnixLauncher {
        type Process = UnixProcess;

        fn spawn(request: &SpawnRequest) -> Result<UnixProcess, ProcessError> {
            let executable = request.executable();
            let mut cmd = Command::new(executable);
            cmd.arg0(executable)
                .args(request.args())
                .env(LAUNCHER_ENV, getpid().to_string());

            let child = cmd
                .spawn()
                .map_err(|e| ProcessError::from_spawn(executable, e))?;

            let pid = Pid::from_raw(child.id() as i32);
            info!(
                pid = %pid,
                role = %request.role(),
                executable = %executable.display(),
                "Spawned Unix process"
            );

            // std's Child neither waits nor kills on drop; reaping is left to the ExitWaiter
            drop(child);
            Ok(UnixProcess::from_native(pid))
        }
    }
}

// Re-export the Unix implementation when on Unix systems
#[cfg(unix)]
pub use unix_impl::{UnixExitWaiter, UnixLauncher, UnixProcess};

// Provide stub types for non-Unix systems
#[cfg(not(unix))]
pub struct UnixProcess;

#[cfg(not(unix))]
pub struct UnixExitWaiter;

#[cfg(not(unix))]
pub struct UnixLauncher;
