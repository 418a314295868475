//! Unix process handles, launching and exit decoding

mod unix_process;

pub use unix_process::{UnixExitWaiter, UnixLauncher, UnixProcess};

/// Unix backend: pid-based handles reaped through waitpid(2)
pub struct UnixBackend;

#[cfg(unix)]
impl proclaunch_core::PlatformBackend for UnixBackend {
    type Process = UnixProcess;
    type Launcher = UnixLauncher;
    type Waiter = UnixExitWaiter;

    fn platform_name() -> &'static str {
        "Unix"
    }
}
