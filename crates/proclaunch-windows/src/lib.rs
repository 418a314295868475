//! Windows process handles, launching and exit decoding

mod windows_process;

pub use windows_process::{WindowsExitWaiter, WindowsLauncher, WindowsProcess};

/// Windows backend: duplicated HANDLEs and single-string command lines
pub struct WindowsBackend;

#[cfg(windows)]
impl proclaunch_core::PlatformBackend for WindowsBackend {
    type Process = WindowsProcess;
    type Launcher = WindowsLauncher;
    type Waiter = WindowsExitWaiter;

    fn platform_name() -> &'static str {
        "Windows"
    }
}
