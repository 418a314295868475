//! Argument-vector contract shared by the launcher and the spawned binary
//!
//! The launcher renders a [`SpawnRequest`] into the argument list of the new
//! process; the spawned binary recovers the same values with
//! [`Invocation::parse`].

use crate::config::{EXTENSION_ARG_COUNT, EXTENSION_MARKER, ExtensionArgs, WORKER_MARKER};
use crate::error::ProcessError;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which launch role a child process assumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Worker,
    Extension,
}

impl Role {
    pub fn marker(self) -> &'static str {
        match self {
            Role::Worker => WORKER_MARKER,
            Role::Extension => EXTENSION_MARKER,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Worker => f.write_str("worker"),
            Role::Extension => f.write_str("extension"),
        }
    }
}

/// A single launch, consumed by a [`Launcher`](crate::Launcher)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    role: Role,
    executable: PathBuf,
    args: Vec<OsString>,
}

impl SpawnRequest {
    /// `[executable, "--worker", caller_args...]`
    pub fn worker<S: AsRef<OsStr>>(executable: impl Into<PathBuf>, caller_args: &[S]) -> Self {
        let args = std::iter::once(OsString::from(WORKER_MARKER))
            .chain(caller_args.iter().map(|a| a.as_ref().to_os_string()))
            .collect();
        Self {
            role: Role::Worker,
            executable: executable.into(),
            args,
        }
    }

    /// `[executable, "--extension", name, socket_path, timeout, interval, verbose]`
    pub fn extension(executable: impl Into<PathBuf>, extension: &ExtensionArgs) -> Self {
        let args = vec![
            OsString::from(EXTENSION_MARKER),
            OsString::from(&extension.name),
            extension.socket_path.clone().into_os_string(),
            OsString::from(extension.timeout_secs.to_string()),
            OsString::from(extension.interval_secs.to_string()),
            OsString::from(extension.verbose.to_string()),
        ];
        Self {
            role: Role::Extension,
            executable: executable.into(),
            args,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments following the executable path, starting with the role marker
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Full argument vector as the child observes it, executable first
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.executable.clone().into_os_string())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Single-string command line for platforms that do not pass discrete arguments
    pub fn command_line(&self) -> String {
        join_command_line(&self.argv())
    }
}

/// Quote one argument so `CommandLineToArgvW` and the MSVC runtime recover it exactly
///
/// Backslashes are only special when they precede a quote, so a run of
/// backslashes is doubled before an embedded quote and before the closing
/// quote.
pub fn quote_argument(arg: &str) -> Cow<'_, str> {
    let needs_quotes = arg.is_empty() || arg.contains([' ', '\t', '\n', '\u{b}', '"']);
    if !needs_quotes {
        return Cow::Borrowed(arg);
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                quoted.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                backslashes = 0;
            }
            _ => {
                quoted.extend(std::iter::repeat_n('\\', backslashes));
                backslashes = 0;
            }
        }
        if c != '\\' {
            quoted.push(c);
        }
    }
    quoted.extend(std::iter::repeat_n('\\', backslashes * 2));
    quoted.push('"');
    Cow::Owned(quoted)
}

/// Quote and space-join a list of arguments
///
/// Values are converted to UTF-8 here, only for platforms that take a single
/// command-line string.
pub fn join_command_line<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| quote_argument(&a.as_ref().to_string_lossy()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// How the current binary was invoked, parsed from its own argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Started with `--worker`; holds the caller arguments after the marker
    Worker(Vec<OsString>),
    /// Started with `--extension` and the five positional values
    Extension(ExtensionArgs),
    /// No role marker; holds the arguments after the executable path
    Supervisor(Vec<OsString>),
}

impl Invocation {
    /// Parse a full argument vector, executable path first
    pub fn parse<I, S>(argv: I) -> Result<Self, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut args: Vec<OsString> = argv.into_iter().skip(1).map(Into::into).collect();
        match args.first().and_then(|a| a.to_str()) {
            Some(WORKER_MARKER) => {
                args.remove(0);
                Ok(Invocation::Worker(args))
            }
            Some(EXTENSION_MARKER) => {
                args.remove(0);
                Self::parse_extension(args).map(Invocation::Extension)
            }
            _ => Ok(Invocation::Supervisor(args)),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Invocation::Worker(_) => Some(Role::Worker),
            Invocation::Extension(_) => Some(Role::Extension),
            Invocation::Supervisor(_) => None,
        }
    }

    fn parse_extension(args: Vec<OsString>) -> Result<ExtensionArgs, ProcessError> {
        let [name, socket_path, timeout, interval, verbose]: [OsString; EXTENSION_ARG_COUNT] =
            args.try_into().map_err(|args: Vec<OsString>| {
                ProcessError::Usage(format!(
                    "{EXTENSION_MARKER} expects {EXTENSION_ARG_COUNT} arguments, got {}",
                    args.len()
                ))
            })?;

        let name = utf8("name", name)?;
        let timeout = utf8("timeout", timeout)?;
        let interval = utf8("interval", interval)?;
        let verbose = utf8("verbose", verbose)?;

        let timeout_secs = timeout
            .parse::<u64>()
            .map_err(|e| ProcessError::invalid_argument("timeout", format!("{timeout:?}: {e}")))?;
        let interval_secs = interval.parse::<u64>().map_err(|e| {
            ProcessError::invalid_argument("interval", format!("{interval:?}: {e}"))
        })?;
        let verbose = verbose.parse::<bool>().map_err(|e| {
            ProcessError::invalid_argument("verbose", format!("{verbose:?}: {e}"))
        })?;

        let extension = ExtensionArgs {
            name,
            socket_path: PathBuf::from(socket_path),
            timeout_secs,
            interval_secs,
            verbose,
        };
        extension
            .validate()
            .map_err(|reason| ProcessError::invalid_argument("extension", reason))?;
        Ok(extension)
    }
}

fn utf8(name: &str, value: OsString) -> Result<String, ProcessError> {
    value.into_string().map_err(|raw| {
        ProcessError::invalid_argument(name, format!("{raw:?} is not valid UTF-8"))
    })
}
