//! Process-wide environment access with an explicit present/absent distinction
//!
//! Values written here are inherited by every process spawned afterwards.

use tracing::debug;

/// Result of reading an environment variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// The variable is set; the value may be empty
    Present(String),
    /// The variable is not set
    Absent,
}

impl EnvValue {
    pub fn is_present(&self) -> bool {
        matches!(self, EnvValue::Present(_))
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            EnvValue::Present(value) => Some(value),
            EnvValue::Absent => None,
        }
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            EnvValue::Present(value) => Some(value),
            EnvValue::Absent => None,
        }
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['=', '\0'])
}

/// Read `name` from the process environment
pub fn get(name: &str) -> EnvValue {
    if !valid_name(name) {
        return EnvValue::Absent;
    }
    match std::env::var_os(name) {
        Some(value) => EnvValue::Present(
            value
                .into_string()
                .unwrap_or_else(|raw| raw.to_string_lossy().into_owned()),
        ),
        None => EnvValue::Absent,
    }
}

/// Set `name` to `value`; returns false if the pair cannot be represented
pub fn set(name: &str, value: &str) -> bool {
    if !valid_name(name) || value.contains('\0') {
        debug!(name = %name, "Rejected environment variable assignment");
        return false;
    }
    // SAFETY: std serializes environment access through its own lock; callers
    // must not hold pointers from libc getenv across this call.
    unsafe { std::env::set_var(name, value) };
    true
}

/// Remove `name`; a later [`get`] reports [`EnvValue::Absent`]
pub fn unset(name: &str) -> bool {
    if !valid_name(name) {
        return false;
    }
    // SAFETY: see `set`.
    unsafe { std::env::remove_var(name) };
    true
}
