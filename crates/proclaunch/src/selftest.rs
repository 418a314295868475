//! Deterministic child-side routine used to verify the launch contract
//!
//! The `proclaunch-selftest` binary runs [`run`] on its own argument vector.
//! A correct launch ends in [`WORKER_SUCCESS_CODE`] or
//! [`EXTENSION_SUCCESS_CODE`]; every mismatch has its own exit code so a
//! failing test names the broken step.

use crate::{
    EXTENSION_SUCCESS_CODE, EnvValue, ExtensionArgs, Invocation, ProcessHandle, WORKER_SUCCESS_CODE,
    env, launcher_process,
};
use std::ffi::OsString;
use std::time::Duration;
use tracing::{debug, error};

/// Caller arguments of the fixed worker self-test
pub const WORKER_ARGS: [&str; 3] = ["worker-test", "--socket", "fake-socket"];

/// Extension names the self-test accepts, including one with embedded quotes
pub const EXTENSION_NAMES: [&str; 2] = ["extension-test", "exten\"sion-te\"st"];
pub const EXTENSION_SOCKET: &str = "socket-name";
pub const EXTENSION_TIMEOUT_SECS: u64 = 100;
pub const EXTENSION_INTERVAL_SECS: u64 = 5;

/// Worker mode: `env-check <name> <value>` succeeds if the variable was inherited
pub const ENV_CHECK: &str = "env-check";
/// Worker mode: `sleep <millis>` succeeds after sleeping
pub const SLEEP: &str = "sleep";
/// Worker mode: `abort` terminates abnormally
pub const ABORT: &str = "abort";

pub const ERROR_USAGE: i32 = 2;
pub const ERROR_COMPARE_ARGUMENT: i32 = 3;
pub const ERROR_LAUNCHER_PROCESS: i32 = 4;
pub const ERROR_ENVIRONMENT: i32 = 5;

/// Extension arguments matching what the self-test expects for `name`
pub fn extension_args(name: &str) -> ExtensionArgs {
    ExtensionArgs {
        name: name.to_string(),
        socket_path: EXTENSION_SOCKET.into(),
        timeout_secs: EXTENSION_TIMEOUT_SECS,
        interval_secs: EXTENSION_INTERVAL_SECS,
        verbose: true,
    }
}

/// Run the self-test for a full argument vector and return the exit code
pub fn run<I, S>(argv: I) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    match Invocation::parse(argv) {
        Ok(Invocation::Worker(args)) => worker(&args),
        Ok(Invocation::Extension(extension)) => extension_main(&extension),
        Ok(Invocation::Supervisor(args)) => {
            error!(args = ?args, "No role marker given");
            ERROR_USAGE
        }
        Err(e) => {
            error!(error = %e, "Failed to parse arguments");
            ERROR_USAGE
        }
    }
}

fn worker(args: &[OsString]) -> i32 {
    match args.first().and_then(|mode| mode.to_str()) {
        Some(ENV_CHECK) => env_check(&args[1..]),
        Some(SLEEP) => {
            let millis = args
                .get(1)
                .and_then(|m| m.to_str())
                .and_then(|m| m.parse::<u64>().ok());
            match millis {
                Some(millis) => {
                    std::thread::sleep(Duration::from_millis(millis));
                    WORKER_SUCCESS_CODE
                }
                None => ERROR_USAGE,
            }
        }
        Some(ABORT) if args.len() == 1 => std::process::abort(),
        _ if args == WORKER_ARGS => check_launcher(),
        _ => {
            error!(args = ?args, expected = ?WORKER_ARGS, "Worker arguments differ");
            ERROR_COMPARE_ARGUMENT
        }
    }
}

fn check_launcher() -> i32 {
    let Some(launcher) = launcher_process() else {
        error!("Launcher process is not available");
        return ERROR_LAUNCHER_PROCESS;
    };
    if launcher.is_same_process(&crate::current_process()) {
        error!("Launcher process resolved to this worker");
        return ERROR_LAUNCHER_PROCESS;
    }
    #[cfg(unix)]
    if launcher.pid() != Some(nix::unistd::getppid().as_raw() as u32) {
        error!(launcher = ?launcher.pid(), "Launcher is not the parent process");
        return ERROR_LAUNCHER_PROCESS;
    }
    debug!(launcher = ?launcher.pid(), "Worker self-test passed");
    WORKER_SUCCESS_CODE
}

fn env_check(args: &[OsString]) -> i32 {
    let [name, value] = args else {
        return ERROR_USAGE;
    };
    let (Some(name), Some(value)) = (name.to_str(), value.to_str()) else {
        return ERROR_USAGE;
    };
    match env::get(name) {
        EnvValue::Present(found) if found == *value => WORKER_SUCCESS_CODE,
        other => {
            error!(name = %name, found = ?other, "Environment variable was not inherited");
            ERROR_ENVIRONMENT
        }
    }
}

fn extension_main(extension: &ExtensionArgs) -> i32 {
    let expected_name = EXTENSION_NAMES.contains(&extension.name.as_str());
    if expected_name && *extension == extension_args(&extension.name) {
        EXTENSION_SUCCESS_CODE
    } else {
        error!(extension = ?extension, "Extension arguments differ");
        ERROR_COMPARE_ARGUMENT
    }
}
