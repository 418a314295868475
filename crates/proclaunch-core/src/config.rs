use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Role marker placed immediately after the executable path for workers
pub const WORKER_MARKER: &str = "--worker";

/// Role marker placed immediately after the executable path for extensions
pub const EXTENSION_MARKER: &str = "--extension";

/// Exit code a worker reports after recognizing its role and completing its self-test
pub const WORKER_SUCCESS_CODE: i32 = 0x57;

/// Exit code an extension reports on its documented success path
pub const EXTENSION_SUCCESS_CODE: i32 = 0x45;

/// Environment variable carrying the launching supervisor's pid into every child
pub const LAUNCHER_ENV: &str = "PROCLAUNCH_LAUNCHER";

/// Number of positional values following [`EXTENSION_MARKER`]
pub const EXTENSION_ARG_COUNT: usize = 5;

/// Launch parameters for an extension process
///
/// Every field is rendered as one positional argument, in declaration order,
/// after the `--extension` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ExtensionArgs {
    /// Extension name; may contain any character, including quotes
    pub name: String,

    /// Path of the local socket the extension connects back to
    pub socket_path: PathBuf,

    /// Seconds the extension waits for the socket to become available
    #[serde(default = "default_timeout_secs")]
    #[builder(default = "default_timeout_secs()")]
    pub timeout_secs: u64,

    /// Seconds between the extension's liveness checks
    #[serde(default = "default_interval_secs")]
    #[builder(default = "default_interval_secs()")]
    pub interval_secs: u64,

    #[serde(default)]
    #[builder(default)]
    pub verbose: bool,
}

impl ExtensionArgs {
    pub fn builder() -> ExtensionArgsBuilder {
        ExtensionArgsBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the values and return an error if the extension could not use them
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("extension name cannot be empty".to_string());
        }
        if self.interval_secs == 0 {
            return Err("interval_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl ExtensionArgsBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.name.as_deref() == Some("") {
            return Err("extension name cannot be empty".to_string());
        }
        if self.interval_secs == Some(0) {
            return Err("interval_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_timeout_secs() -> u64 {
    3
}
fn default_interval_secs() -> u64 {
    3
}
