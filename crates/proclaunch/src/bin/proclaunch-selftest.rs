//! Child binary for the launch-contract tests
//!
//! Logging is controlled by `PROCLAUNCH_LOG` (an `EnvFilter` directive,
//! default `warn`) and `PROCLAUNCH_LOG_FORMAT=json`.

use proclaunch::env;
use tracing_subscriber::EnvFilter;

fn init_tracing() -> anyhow::Result<()> {
    let filter = match env::get("PROCLAUNCH_LOG").into_option() {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::new("warn"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if env::get("PROCLAUNCH_LOG_FORMAT").as_deref() == Some("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let code = proclaunch::selftest::run(std::env::args_os());
    std::process::exit(code)
}
