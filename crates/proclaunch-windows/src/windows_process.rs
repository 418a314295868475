#[cfg(windows)]
mod windows_impl {
    use proclaunch_core::{
        ExitOutcome, ExitWaiter, LAUNCHER_ENV, Launcher, ProcessError, ProcessHandle, ProcessId,
        SpawnRequest, join_command_line,
    };
    use std::os::windows::io::AsRawHandle;
    use std::os::windows::process::CommandExt;
    use std::process::Command;
    use std::sync::{Arc, OnceLock};
    use tracing::{debug, info, warn};
    use windows::Win32::Foundation::{
        CloseHandle, DUPLICATE_SAME_ACCESS, DuplicateHandle, HANDLE, STILL_ACTIVE, WAIT_FAILED,
        WAIT_OBJECT_0, WAIT_TIMEOUT,
    };
    use windows::Win32::System::Threading::{
        GetCurrentProcess, GetCurrentProcessId, GetExitCodeProcess, GetProcessId, INFINITE,
        OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_SYNCHRONIZE,
        WaitForSingleObject,
    };

    /// NTSTATUS severity bits set by unhandled exceptions and fatal app exits
    const ERROR_SEVERITY_MASK: u32 = 0xC000_0000;

    /// Windows process handle owning a duplicated kernel reference
    #[derive(Debug)]
    pub struct WindowsProcess {
        handle: HANDLE,
        valid: bool,
        outcome: OnceLock<ExitOutcome>,
    }

    // SAFETY: process handles are kernel objects usable from any thread; the
    // duplicated reference is only closed in Drop.
    unsafe impl Send for WindowsProcess {}
    unsafe impl Sync for WindowsProcess {}

    /// Duplicate `source` into a reference owned by the caller
    fn duplicate(source: HANDLE) -> Option<HANDLE> {
        let mut target = HANDLE::default();
        // SAFETY: `target` is a valid out pointer; failure leaves it untouched.
        let result = unsafe {
            let current = GetCurrentProcess();
            DuplicateHandle(
                current,
                source,
                current,
                &mut target,
                0,
                false,
                DUPLICATE_SAME_ACCESS,
            )
        };
        match result {
            Ok(()) => {
                debug!(source = ?source, duplicate = ?target, "Duplicated process handle");
                Some(target)
            }
            Err(e) => {
                debug!(source = ?source, error = %e, "DuplicateHandle failed");
                None
            }
        }
    }

    impl WindowsProcess {
        fn from_duplicate(handle: Option<HANDLE>) -> Self {
            Self {
                valid: handle.is_some(),
                handle: handle.unwrap_or_default(),
                outcome: OnceLock::new(),
            }
        }

        fn record(&self, outcome: ExitOutcome) -> ExitOutcome {
            *self.outcome.get_or_init(|| outcome)
        }
    }

    impl ProcessHandle for WindowsProcess {
        type Native = HANDLE;

        const INVALID: HANDLE = HANDLE(std::ptr::null_mut());

        fn from_native(handle: HANDLE) -> Self {
            if handle.is_invalid() {
                return Self::from_duplicate(None);
            }
            Self::from_duplicate(duplicate(handle))
        }

        fn from_pid(pid: ProcessId) -> Self {
            // SAFETY: plain Win32 call; the returned handle is closed below.
            let opened = unsafe {
                OpenProcess(
                    PROCESS_QUERY_LIMITED_INFORMATION | PROCESS_SYNCHRONIZE,
                    false,
                    pid,
                )
            };
            match opened {
                Ok(handle) => {
                    let process = Self::from_native(handle);
                    // SAFETY: `handle` came from OpenProcess and is not used again.
                    let _ = unsafe { CloseHandle(handle) };
                    process
                }
                Err(e) => {
                    debug!(pid, error = %e, "OpenProcess failed");
                    Self::invalid()
                }
            }
        }

        fn current() -> Arc<Self> {
            // The pseudo-handle reads as INVALID_HANDLE_VALUE, so it bypasses from_native
            // SAFETY: GetCurrentProcess has no preconditions.
            let pseudo = unsafe { GetCurrentProcess() };
            Arc::new(Self::from_duplicate(duplicate(pseudo)))
        }

        fn is_valid(&self) -> bool {
            self.valid
        }

        fn native(&self) -> HANDLE {
            self.handle
        }

        fn pid(&self) -> Option<ProcessId> {
            if !self.valid {
                return None;
            }
            // SAFETY: `self.handle` is an open process handle owned by self.
            let pid = unsafe { GetProcessId(self.handle) };
            (pid != 0).then_some(pid)
        }
    }

    impl Drop for WindowsProcess {
        fn drop(&mut self) {
            if self.valid {
                // SAFETY: the handle was duplicated for this instance and is closed once.
                if let Err(e) = unsafe { CloseHandle(self.handle) } {
                    warn!(error = %e, "Failed to close process handle");
                }
            }
        }
    }

    fn decode_exit_code(code: u32) -> ExitOutcome {
        if code & ERROR_SEVERITY_MASK == ERROR_SEVERITY_MASK {
            debug!(code = format_args!("{code:#010x}"), "Process terminated by exception");
            ExitOutcome::Abnormal
        } else {
            ExitOutcome::Exited(code as i32)
        }
    }

    fn read_exit_code(process: &WindowsProcess) -> ExitOutcome {
        let mut code = 0u32;
        // SAFETY: valid handle and out pointer.
        if let Err(e) = unsafe { GetExitCodeProcess(process.handle, &mut code) } {
            warn!(error = %e, "GetExitCodeProcess failed");
            return ExitOutcome::WaitFailed;
        }
        if code == STILL_ACTIVE.0 as u32 {
            return ExitOutcome::WaitFailed;
        }
        process.record(decode_exit_code(code))
    }

    /// Exit waiter built on WaitForSingleObject and GetExitCodeProcess
    pub struct WindowsExitWaiter;

    impl ExitWaiter for WindowsExitWaiter {
        type Process = WindowsProcess;

        fn blocking_exit_code(process: &WindowsProcess) -> ExitOutcome {
            if !process.is_valid() {
                return ExitOutcome::WaitFailed;
            }
            if let Some(outcome) = process.outcome.get() {
                return *outcome;
            }

            loop {
                // SAFETY: `process.handle` stays open for the lifetime of `process`.
                let ret = unsafe { WaitForSingleObject(process.handle, INFINITE) };
                if ret == WAIT_OBJECT_0 {
                    break;
                }
                if ret == WAIT_FAILED {
                    warn!(pid = ?process.pid(), "WaitForSingleObject failed");
                    return ExitOutcome::WaitFailed;
                }
            }
            read_exit_code(process)
        }

        fn try_exit_code(process: &WindowsProcess) -> Option<ExitOutcome> {
            if !process.is_valid() {
                return Some(ExitOutcome::WaitFailed);
            }
            if let Some(outcome) = process.outcome.get() {
                return Some(*outcome);
            }

            // SAFETY: as above.
            let ret = unsafe { WaitForSingleObject(process.handle, 0) };
            if ret == WAIT_TIMEOUT {
                None
            } else if ret == WAIT_OBJECT_0 {
                Some(read_exit_code(process))
            } else {
                Some(ExitOutcome::WaitFailed)
            }
        }
    }

    /// Launcher building one quoted command line for CreateProcessW
    pub struct WindowsLauncher;

    impl Launcher for WindowsLauncher {
        type Process = WindowsProcess;

        fn spawn(request: &SpawnRequest) -> Result<WindowsProcess, ProcessError> {
            let executable = request.executable();
            let mut cmd = Command::new(executable);
            // raw_arg bypasses std's quoting so the command line is exactly ours
            cmd.raw_arg(join_command_line(request.args()));
            // SAFETY: GetCurrentProcessId has no preconditions.
            cmd.env(LAUNCHER_ENV, unsafe { GetCurrentProcessId() }.to_string());

            // CREATE_NO_WINDOW (0x08000000) - children are background processes
            cmd.creation_flags(0x08000000);

            debug!(command_line = %request.command_line(), "Launching Windows process");
            let child = cmd
                .spawn()
                .map_err(|e| ProcessError::from_spawn(executable, e))?;

            let process = WindowsProcess::from_native(HANDLE(child.as_raw_handle()));
            info!(
                pid = child.id(),
                role = %request.role(),
                executable = %executable.display(),
                "Spawned Windows process"
            );

            // Dropping Child closes its own handle; the process keeps running
            drop(child);
            Ok(process)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use windows::Win32::System::Threading::PROCESS_ALL_ACCESS;

        #[test]
        fn test_invalid_sentinel() {
            let process = WindowsProcess::invalid();
            assert!(!process.is_valid());
            assert_eq!(process.pid(), None);
            assert_eq!(
                WindowsExitWaiter::blocking_exit_code(&process),
                ExitOutcome::WaitFailed
            );
        }

        #[test]
        fn test_duplicates_supplied_handle() {
            let handle =
                unsafe { OpenProcess(PROCESS_ALL_ACCESS, false, GetCurrentProcessId()) }.unwrap();
            assert!(!handle.is_invalid());

            let process = WindowsProcess::from_native(handle);
            assert!(process.is_valid());
            assert_ne!(process.native(), handle);
            assert_eq!(process.pid(), Some(std::process::id()));

            unsafe { CloseHandle(handle) }.unwrap();
            // The duplicate outlives the original reference
            assert_eq!(process.pid(), Some(std::process::id()));
        }

        #[test]
        fn test_current_process() {
            let process = WindowsProcess::current();
            assert!(process.is_valid());
            assert_eq!(process.pid(), Some(std::process::id()));
            assert!(process.is_same_process(&WindowsProcess::from_pid(std::process::id())));
            assert_eq!(WindowsExitWaiter::try_exit_code(&process), None);
        }

        #[test]
        fn test_exit_code_decoding() {
            assert_eq!(decode_exit_code(0x57), ExitOutcome::Exited(0x57));
            assert_eq!(decode_exit_code(0xC000_0005), ExitOutcome::Abnormal);
            assert_eq!(decode_exit_code(0x4000_0015), ExitOutcome::Exited(0x4000_0015));
        }
    }
}

#[cfg(windows)]
pub use windows_impl::{WindowsExitWaiter, WindowsLauncher, WindowsProcess};

// Provide stub types for non-Windows systems
#[cfg(not(windows))]
pub struct WindowsProcess;

#[cfg(not(windows))]
pub struct WindowsExitWaiter;

#[cfg(not(windows))]
pub struct WindowsLauncher;
