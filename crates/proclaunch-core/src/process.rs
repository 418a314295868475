use crate::args::SpawnRequest;
use crate::config::{ExtensionArgs, LAUNCHER_ENV};
use crate::env::{self, EnvValue};
use crate::error::ProcessError;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Unique identifier for a process
pub type ProcessId = u32;

/// How a waited-on process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitOutcome {
    /// Process exited normally with the given exit code
    Exited(i32),
    /// Process terminated by a signal (Unix) or an unhandled exception (Windows)
    Abnormal,
    /// The wait itself could not complete (invalid handle, OS error, not our child)
    WaitFailed,
}

impl ExitOutcome {
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitOutcome::Exited(code) => Some(*code),
            _ => None,
        }
    }

    /// True only for a normal exit with code zero
    pub fn success(&self) -> bool {
        self.code() == Some(0)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exited with code {code}"),
            ExitOutcome::Abnormal => f.write_str("terminated abnormally"),
            ExitOutcome::WaitFailed => f.write_str("wait failed"),
        }
    }
}

/// Trait representing a reference to an OS process
///
/// A handle never owns the process itself: dropping it releases any kernel
/// reference it duplicated but leaves the process running. Validity reflects
/// whether the process existed when the handle was built, not whether it is
/// still alive; only an [`ExitWaiter`] can tell those apart.
pub trait ProcessHandle: Send + Sync + Sized + 'static {
    /// The platform's native process reference
    type Native: Copy + PartialEq + fmt::Debug;

    /// Sentinel that never denotes a process
    const INVALID: Self::Native;

    /// Wrap an existing native reference, duplicating it where the platform requires
    fn from_native(native: Self::Native) -> Self;

    /// Open a handle to the process identified by `pid`
    fn from_pid(pid: ProcessId) -> Self;

    /// Handle to the calling process
    fn current() -> Arc<Self>;

    fn invalid() -> Self {
        Self::from_native(Self::INVALID)
    }

    fn is_valid(&self) -> bool;

    /// The native reference owned by this handle
    fn native(&self) -> Self::Native;

    /// Process identifier, `None` for invalid handles
    fn pid(&self) -> Option<ProcessId>;

    /// Handle to the supervisor that launched the calling process, if any
    fn launcher() -> Option<Arc<Self>> {
        let pid = match env::get(LAUNCHER_ENV) {
            EnvValue::Present(value) => value.parse::<ProcessId>().ok()?,
            EnvValue::Absent => return None,
        };
        let process = Self::from_pid(pid);
        process.is_valid().then(|| Arc::new(process))
    }

    /// Check whether both handles refer to the same live-at-construction process
    fn is_same_process(&self, other: &Self) -> bool {
        matches!((self.pid(), other.pid()), (Some(a), Some(b)) if a == b)
    }
}

/// Strategy that observes how a process terminated
pub trait ExitWaiter {
    type Process: ProcessHandle;

    /// Block until the process terminates and decode its termination
    ///
    /// Invalid handles return [`ExitOutcome::WaitFailed`] without waiting.
    fn blocking_exit_code(process: &Self::Process) -> ExitOutcome;

    /// Check for termination without blocking; `None` while still running
    fn try_exit_code(process: &Self::Process) -> Option<ExitOutcome>;
}

/// Spawns worker and extension processes
pub trait Launcher {
    type Process: ProcessHandle;

    /// Start the process image described by `request` without waiting for it
    fn spawn(request: &SpawnRequest) -> Result<Self::Process, ProcessError>;

    fn try_launch_worker<S: AsRef<OsStr>>(
        executable: &Path,
        caller_args: &[S],
    ) -> Result<Arc<Self::Process>, ProcessError> {
        Self::spawn(&SpawnRequest::worker(executable, caller_args)).map(Arc::new)
    }

    /// Validate `extension` and spawn it
    ///
    /// An empty name or a zero poll interval is rejected with
    /// [`ProcessError::InvalidArgument`] before any process is started.
    fn try_launch_extension(
        executable: &Path,
        extension: &ExtensionArgs,
    ) -> Result<Arc<Self::Process>, ProcessError> {
        extension
            .validate()
            .map_err(|reason| ProcessError::invalid_argument("extension", reason))?;
        Self::spawn(&SpawnRequest::extension(executable, extension)).map(Arc::new)
    }

    /// Launch a worker; spawn failures are logged and reported as `None`
    fn launch_worker<S: AsRef<OsStr>>(
        executable: &Path,
        caller_args: &[S],
    ) -> Option<Arc<Self::Process>> {
        log_launch("worker", executable, Self::try_launch_worker(executable, caller_args))
    }

    /// Launch an extension; spawn failures are logged and reported as `None`
    ///
    /// Arguments that fail [`ExtensionArgs::validate`] are also reported as
    /// `None` and no process is started.
    fn launch_extension(
        executable: &Path,
        extension: &ExtensionArgs,
    ) -> Option<Arc<Self::Process>> {
        log_launch(
            "extension",
            executable,
            Self::try_launch_extension(executable, extension),
        )
    }
}

fn log_launch<P: ProcessHandle>(
    role: &str,
    executable: &Path,
    result: Result<Arc<P>, ProcessError>,
) -> Option<Arc<P>> {
    match result {
        Ok(process) => {
            info!(role, pid = ?process.pid(), executable = %executable.display(), "Launched process");
            Some(process)
        }
        Err(e) => {
            warn!(role, executable = %executable.display(), error = %e, "Failed to launch process");
            None
        }
    }
}

/// Compile-time bundle of one platform's handle, launcher and waiter
pub trait PlatformBackend {
    type Process: ProcessHandle;
    type Launcher: Launcher<Process = Self::Process>;
    type Waiter: ExitWaiter<Process = Self::Process>;

    /// Get the platform name for logging and debugging
    fn platform_name() -> &'static str;
}
