// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::{
    collections::BTreeMap,
    env,
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use serde_json::Value;

use crate::{fs, layout::Layout, literal};

/// The variables a `*.gyp_env` file may provide. Anything else in the file is ignored.
pub(crate) const SUPPORTED_VARS: &[&str] =
    &["GYP_DEFINES", "GYP_GENERATOR_FLAGS", "GYP_GENERATORS", "GYP_MSVS_VERSION"];

/// If set (to any value), `syzygy.gyp_env` is not applied.
pub(crate) const SKIP_GYP_ENV: &str = "SKIP_SYZYGY_GYP_ENV";

/// Access to the environment variables that are passed on to gyp.
pub(crate) trait Environment {
    fn var(&self, key: &str) -> Option<OsString>;

    fn set_var(&mut self, key: &str, value: &str);

    fn contains(&self, key: &str) -> bool {
        self.var(key).is_some()
    }
}

/// The environment of the current process, overlaid with the values applied
/// from `*.gyp_env` files.
///
/// Applied values are never written to this process's environment; they are
/// handed to child processes through [`ProcessEnv::applied`].
#[derive(Debug, Default)]
pub(crate) struct ProcessEnv {
    applied: BTreeMap<String, String>,
}

impl ProcessEnv {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The variables set on top of the inherited environment.
    pub(crate) fn applied(&self) -> impl Iterator<Item = (&str, &str)> {
        self.applied.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<OsString> {
        match self.applied.get(key) {
            Some(value) => Some(value.into()),
            None => env::var_os(key),
        }
    }

    fn set_var(&mut self, key: &str, value: &str) {
        self.applied.insert(key.to_owned(), value.to_owned());
    }
}

/// A `*.gyp_env` file that is not a valid literal mapping.
#[derive(Debug)]
pub(crate) struct ConfigSyntaxError {
    /// Absolute path of the offending file.
    pub(crate) path: PathBuf,
    pub(crate) error: literal::ParseError,
}

impl fmt::Display for ConfigSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse `{}`: {}", self.path.display(), self.error)
    }
}

impl std::error::Error for ConfigSyntaxError {}

/// Applies `syzygy.gyp_env` from the source root unless [`SKIP_GYP_ENV`] is set.
pub(crate) fn apply_project_env(env: &mut impl Environment, layout: &Layout) -> Result<()> {
    if env.contains(SKIP_GYP_ENV) {
        return Ok(());
    }
    apply_from_file(env, &layout.gyp_env_file())
}

/// Reads a `*.gyp_env` file and sets each supported variable it provides,
/// unless that variable is already present in `env`.
///
/// A missing file is not an error.
pub(crate) fn apply_from_file(env: &mut impl Environment, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let contents = fs::read_to_string(path)?;
    let map = literal::parse_mapping(&contents)
        .map_err(|error| ConfigSyntaxError { path: fs::absolute(path), error })?;

    for &var in SUPPORTED_VARS {
        let Some(value) = map.get(var) else { continue };
        if !is_set(value) {
            continue;
        }
        if env.contains(var) {
            info!(
                "environment value for `{var}` overrides value in {}",
                fs::absolute(path).display()
            );
            continue;
        }
        env.set_var(var, &env_value(var, value, path)?);
    }
    Ok(())
}

/// Values that are false in a boolean context (empty strings and containers,
/// `None`, `False`, zero) are treated as not provided.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Array(v) => !v.is_empty(),
        Value::Object(v) => !v.is_empty(),
    }
}

/// Converts a literal to the value of an environment variable.
fn env_value(var: &str, value: &Value, path: &Path) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => bail!(
            "value for `{var}` in {} must be a string, found `{value}`",
            fs::absolute(path).display()
        ),
    }
}
