use proclaunch_core::PlatformBackend;

/// Backend selected for the current platform at compile time
#[cfg(unix)]
pub type Platform = proclaunch_unix::UnixBackend;
#[cfg(unix)]
pub type PlatformProcess = proclaunch_unix::UnixProcess;
#[cfg(unix)]
pub type PlatformLauncher = proclaunch_unix::UnixLauncher;
#[cfg(unix)]
pub type PlatformExitWaiter = proclaunch_unix::UnixExitWaiter;

#[cfg(windows)]
pub type Platform = proclaunch_windows::WindowsBackend;
#[cfg(windows)]
pub type PlatformProcess = proclaunch_windows::WindowsProcess;
#[cfg(windows)]
pub type PlatformLauncher = proclaunch_windows::WindowsLauncher;
#[cfg(windows)]
pub type PlatformExitWaiter = proclaunch_windows::WindowsExitWaiter;

#[cfg(not(any(unix, windows)))]
compile_error!("Unsupported platform: only Unix and Windows are currently supported");

pub fn platform_name() -> &'static str {
    Platform::platform_name()
}
