// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::{
    collections::BTreeMap,
    ffi::{OsStr, OsString},
    fmt,
    path::Path,
    process::{Command, ExitStatus},
};

use anyhow::{Context as _, Result};

macro_rules! cmd {
    ($program:expr $(, $arg:expr)* $(,)?) => {{
        let mut _cmd = crate::process::ProcessBuilder::new($program);
        $(
            _cmd.arg($arg);
        )*
        _cmd
    }};
}

// Based on https://github.com/rust-lang/cargo/blob/0.39.0/src/cargo/util/process_builder.rs

/// A builder object for an external process, similar to `std::process::Command`.
#[derive(Clone, Debug)]
pub(crate) struct ProcessBuilder {
    /// The program to execute.
    program: OsString,
    /// A list of arguments to pass to the program.
    args: Vec<OsString>,
    /// Any environment variables that should be set for the program, on top
    /// of the inherited environment.
    env: BTreeMap<String, OsString>,
}

impl ProcessBuilder {
    /// Creates a new `ProcessBuilder`.
    pub(crate) fn new(program: impl Into<OsString>) -> Self {
        Self { program: program.into(), args: vec![], env: BTreeMap::new() }
    }

    /// (chainable) Adds `arg` to the args list.
    pub(crate) fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// (chainable) Adds multiple `args` to the args list.
    pub(crate) fn args(&mut self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> &mut Self {
        self.args.extend(args.into_iter().map(|t| t.as_ref().to_os_string()));
        self
    }

    /// (chainable) Sets an environment variable for the process.
    pub(crate) fn env(&mut self, key: &str, val: impl AsRef<OsStr>) -> &mut Self {
        self.env.insert(key.to_owned(), val.as_ref().to_os_string());
        self
    }

    /// Gets the executable name.
    #[cfg(test)]
    pub(crate) fn get_program(&self) -> &OsStr {
        &self.program
    }

    /// Gets the program arguments.
    #[cfg(test)]
    pub(crate) fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Gets an environment variable explicitly set for the process.
    #[cfg(test)]
    pub(crate) fn get_env(&self, key: &str) -> Option<&OsStr> {
        self.env.get(key).map(OsString::as_os_str)
    }

    /// Runs the process to completion and returns its exit status.
    ///
    /// An unsuccessful exit is not an error: the caller decides what to do
    /// with the status.
    pub(crate) fn status(&self) -> Result<ExitStatus> {
        let mut command = self.build_command();
        command
            .status()
            .with_context(|| ProcessError::new(&format!("could not execute process {self}"), None))
    }

    /// Maps `status` to the exit code to pass on; a process that was killed
    /// by a signal has none, which is an error.
    pub(crate) fn exit_code(&self, status: ExitStatus) -> Result<i32> {
        match status.code() {
            Some(code) => Ok(code),
            None => Err(ProcessError::new(
                &format!("process didn't exit successfully: {self}"),
                Some(status),
            )
            .into()),
        }
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.envs(&self.env);
        command
    }
}

impl fmt::Display for ProcessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("`")?;

        for (key, val) in &self.env {
            write!(f, "{key}={} ", val.to_string_lossy())?;
        }

        write!(f, "{}", Path::new(&self.program).file_stem().unwrap_or_default().to_string_lossy())?;

        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }

        f.write_str("`")
    }
}

// =============================================================================
// Process errors

// Based on https://github.com/rust-lang/cargo/blob/0.39.0/src/cargo/util/errors.rs

#[derive(Debug)]
pub(crate) struct ProcessError {
    desc: String,
}

impl ProcessError {
    fn new(msg: &str, status: Option<ExitStatus>) -> Self {
        let exit = match status {
            Some(s) => s.to_string(),
            None => "never executed".to_owned(),
        };
        Self { desc: format!("{msg} ({exit})") }
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.desc, f)
    }
}

impl std::error::Error for ProcessError {}
