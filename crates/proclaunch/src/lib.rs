//! Launch and monitor worker and extension subprocesses
//!
//! The platform backend is chosen at compile time; every function here works
//! with [`PlatformProcess`] handles shared through `Arc`.
//!
//! ```rust,no_run
//! use proclaunch::{ExitOutcome, WORKER_SUCCESS_CODE};
//!
//! let exe = std::env::current_exe().unwrap();
//! let worker = proclaunch::launch_worker(&exe, &["--socket", "/tmp/s"]).unwrap();
//! match proclaunch::blocking_exit_code(&worker) {
//!     ExitOutcome::Exited(code) if code == WORKER_SUCCESS_CODE => {}
//!     other => eprintln!("worker {other}"),
//! }
//! ```

mod factory;
pub mod selftest;

pub use factory::{Platform, PlatformExitWaiter, PlatformLauncher, PlatformProcess, platform_name};
pub use proclaunch_core::*;

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

/// Launch `executable` in the worker role; `None` if the spawn failed
pub fn launch_worker<S: AsRef<OsStr>>(
    executable: &Path,
    caller_args: &[S],
) -> Option<Arc<PlatformProcess>> {
    PlatformLauncher::launch_worker(executable, caller_args)
}

/// Launch `executable` in the extension role; `None` if the spawn failed
pub fn launch_extension(
    executable: &Path,
    extension: &ExtensionArgs,
) -> Option<Arc<PlatformProcess>> {
    PlatformLauncher::launch_extension(executable, extension)
}

pub fn current_process() -> Arc<PlatformProcess> {
    PlatformProcess::current()
}

/// Handle to the supervisor that launched this process
pub fn launcher_process() -> Option<Arc<PlatformProcess>> {
    PlatformProcess::launcher()
}

pub fn blocking_exit_code(process: &PlatformProcess) -> ExitOutcome {
    PlatformExitWaiter::blocking_exit_code(process)
}

pub fn try_exit_code(process: &PlatformProcess) -> Option<ExitOutcome> {
    PlatformExitWaiter::try_exit_code(process)
}

/// Wait for `process` on tokio's blocking pool
///
/// One task per child lets a supervisor watch many children at once. The
/// wait cannot be cancelled; dropping the future leaves the blocking wait
/// running until the process exits.
pub async fn wait_for_exit(process: Arc<PlatformProcess>) -> ExitOutcome {
    match tokio::task::spawn_blocking(move || blocking_exit_code(&process)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "Exit wait task failed");
            ExitOutcome::WaitFailed
        }
    }
}
