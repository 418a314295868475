use proclaunch::selftest::{self, EXTENSION_NAMES, WORKER_ARGS};
use proclaunch::{
    EXTENSION_SUCCESS_CODE, EnvValue, ExitOutcome, Launcher, PlatformProcess, ProcessError,
    ProcessHandle, WORKER_SUCCESS_CODE, env,
};
use std::path::Path;
use std::sync::Arc;

const SELFTEST: &str = env!("CARGO_BIN_EXE_proclaunch-selftest");

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_file(true)
        .with_thread_ids(false)
        .with_target(false)
        .with_line_number(true)
        .with_test_writer()
        .try_init();
}

fn selftest_path() -> &'static Path {
    Path::new(SELFTEST)
}

#[test]
fn test_invalid_handle() {
    let process = PlatformProcess::invalid();
    assert!(!process.is_valid());
    assert_eq!(process.pid(), None);
    assert_eq!(proclaunch::blocking_exit_code(&process), ExitOutcome::WaitFailed);
}

#[test]
fn test_current_process() {
    let process = proclaunch::current_process();
    assert!(process.is_valid());
    assert_eq!(process.pid(), Some(std::process::id()));
}

#[cfg(unix)]
#[test]
fn test_constructor_posix() {
    let pid = nix::unistd::getpid();
    let process = PlatformProcess::from_native(pid);
    assert!(process.is_valid());
    assert_eq!(process.native(), pid);
}

#[test]
fn test_env_var() {
    let name = "PROCLAUNCH_INTEGRATION_ENV";
    assert_eq!(env::get(name), EnvValue::Absent);

    assert!(env::set(name, "true"));
    assert_eq!(env::get(name), EnvValue::Present("true".to_string()));

    assert!(env::unset(name));
    assert_eq!(env::get(name), EnvValue::Absent);
}

#[test]
fn test_launch_worker() {
    init_tracing();
    let process = proclaunch::launch_worker(selftest_path(), &WORKER_ARGS)
        .expect("worker should launch");
    assert!(process.is_valid());

    assert_eq!(
        proclaunch::blocking_exit_code(&process),
        ExitOutcome::Exited(WORKER_SUCCESS_CODE)
    );
}

#[test]
fn test_launch_extension() {
    init_tracing();
    let extension = selftest::extension_args("extension-test");
    let process =
        proclaunch::launch_extension(selftest_path(), &extension).expect("extension should launch");

    assert_eq!(
        proclaunch::blocking_exit_code(&process),
        ExitOutcome::Exited(EXTENSION_SUCCESS_CODE)
    );
}

#[test]
fn test_launch_extension_quotes() {
    init_tracing();
    let name = EXTENSION_NAMES[1];
    assert!(name.contains('"'));

    let process = proclaunch::launch_extension(selftest_path(), &selftest::extension_args(name))
        .expect("extension should launch");
    assert_eq!(
        proclaunch::blocking_exit_code(&process),
        ExitOutcome::Exited(EXTENSION_SUCCESS_CODE)
    );
}

#[test]
fn test_invalid_extension_not_spawned() {
    init_tracing();
    let mut extension = selftest::extension_args("extension-test");
    extension.name.clear();
    assert!(proclaunch::launch_extension(selftest_path(), &extension).is_none());
    let result = proclaunch::PlatformLauncher::try_launch_extension(selftest_path(), &extension);
    assert!(matches!(result, Err(ProcessError::InvalidArgument { .. })));

    let mut extension = selftest::extension_args("extension-test");
    extension.interval_secs = 0;
    assert!(proclaunch::launch_extension(selftest_path(), &extension).is_none());
    let result = proclaunch::PlatformLauncher::try_launch_extension(selftest_path(), &extension);
    assert!(matches!(result, Err(ProcessError::InvalidArgument { .. })));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_worker_argument() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    // The child compares the bytes instead of panicking while collecting argv
    let args = [OsStr::from_bytes(b"worker-\xfftest")];
    let process =
        proclaunch::launch_worker(selftest_path(), &args).expect("worker should launch");
    assert_eq!(
        proclaunch::blocking_exit_code(&process),
        ExitOutcome::Exited(selftest::ERROR_COMPARE_ARGUMENT)
    );
}

#[test]
fn test_launch_missing_executable() {
    let missing = Path::new("/nonexistent/proclaunch-selftest");
    assert!(proclaunch::launch_worker(missing, &WORKER_ARGS).is_none());
    assert!(
        proclaunch::launch_extension(missing, &selftest::extension_args("extension-test"))
            .is_none()
    );

    let result = proclaunch::PlatformLauncher::try_launch_worker(missing, &WORKER_ARGS);
    assert!(result.is_err_and(|e| e.is_permanent()));
}

#[test]
fn test_child_inherits_environment() {
    let name = "PROCLAUNCH_INHERITED_VALUE";
    assert!(env::set(name, "from supervisor"));

    let process =
        proclaunch::launch_worker(selftest_path(), &["env-check", name, "from supervisor"])
            .expect("worker should launch");
    assert_eq!(
        proclaunch::blocking_exit_code(&process),
        ExitOutcome::Exited(WORKER_SUCCESS_CODE)
    );

    assert!(env::unset(name));
}

#[test]
fn test_unset_variable_not_inherited() {
    let name = "PROCLAUNCH_REMOVED_VALUE";
    assert!(env::set(name, "gone"));
    assert!(env::unset(name));

    let process = proclaunch::launch_worker(selftest_path(), &["env-check", name, "gone"])
        .expect("worker should launch");
    assert_eq!(
        proclaunch::blocking_exit_code(&process),
        ExitOutcome::Exited(selftest::ERROR_ENVIRONMENT)
    );
}

#[test]
fn test_wrong_worker_arguments_reported() {
    let process = proclaunch::launch_worker(selftest_path(), &["unexpected"])
        .expect("worker should launch");
    assert_eq!(
        proclaunch::blocking_exit_code(&process),
        ExitOutcome::Exited(selftest::ERROR_COMPARE_ARGUMENT)
    );
}

#[test]
fn test_try_exit_code_while_running() {
    let process = proclaunch::launch_worker(selftest_path(), &["sleep", "2000"])
        .expect("worker should launch");
    assert_eq!(proclaunch::try_exit_code(&process), None);

    let outcome = proclaunch::blocking_exit_code(&process);
    assert_eq!(outcome, ExitOutcome::Exited(WORKER_SUCCESS_CODE));
    // The termination is cached on the handle after the first wait
    assert_eq!(proclaunch::try_exit_code(&process), Some(outcome));
    assert_eq!(proclaunch::blocking_exit_code(&process), outcome);
}

#[test]
fn test_abnormal_termination() {
    let process =
        proclaunch::launch_worker(selftest_path(), &["abort"]).expect("worker should launch");
    assert_eq!(proclaunch::blocking_exit_code(&process), ExitOutcome::Abnormal);
}

#[test]
fn test_concurrent_waits_on_one_handle() {
    init_tracing();
    let process = proclaunch::launch_worker(selftest_path(), &["sleep", "300"])
        .expect("worker should launch");

    let outcomes = std::thread::scope(|s| {
        let waits: Vec<_> = (0..2)
            .map(|_| s.spawn(|| proclaunch::blocking_exit_code(&process)))
            .collect();
        waits
            .into_iter()
            .map(|wait| wait.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(
        outcomes,
        vec![ExitOutcome::Exited(WORKER_SUCCESS_CODE); 2]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_wait_for_exit_on_shared_handle() {
    let process = proclaunch::launch_worker(selftest_path(), &["sleep", "300"])
        .expect("worker should launch");

    let (first, second) = tokio::join!(
        proclaunch::wait_for_exit(Arc::clone(&process)),
        proclaunch::wait_for_exit(process)
    );
    assert_eq!(first, ExitOutcome::Exited(WORKER_SUCCESS_CODE));
    assert_eq!(second, first);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_workers() {
    init_tracing();
    let mut waits = Vec::new();
    for _ in 0..4 {
        let process = proclaunch::launch_worker(selftest_path(), &WORKER_ARGS)
            .expect("worker should launch");
        waits.push(tokio::spawn(proclaunch::wait_for_exit(process)));
    }

    for wait in waits {
        assert_eq!(
            wait.await.unwrap(),
            ExitOutcome::Exited(WORKER_SUCCESS_CODE)
        );
    }
}

#[tokio::test]
async fn test_wait_for_exit_invalid_handle() {
    let process = Arc::new(PlatformProcess::invalid());
    assert_eq!(proclaunch::wait_for_exit(process).await, ExitOutcome::WaitFailed);
}
