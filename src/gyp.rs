// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::{
    env,
    ffi::{OsStr, OsString},
    path::PathBuf,
};

use anyhow::{bail, Context as _, Result};

use crate::{gyp_env::Environment, layout::Layout, process::ProcessBuilder};

const PYTHON_ENV: &str = "PYTHON";
const PYTHONPATH: &str = "PYTHONPATH";

/// Returns the interpreter used to run gyp: `explicit` if given, then
/// `$PYTHON`, then `python` from `PATH`.
pub(crate) fn python(explicit: Option<&OsStr>, env: &impl Environment) -> OsString {
    match explicit {
        Some(python) => python.to_owned(),
        None => env
            .var(PYTHON_ENV)
            .filter(|python| !python.is_empty())
            .unwrap_or_else(|| OsString::from("python")),
    }
}

/// Builds the command that runs `gyp_main.py` with `args`.
///
/// The gyp python package and the gyp plugin directory are appended to the
/// module search path; everything else is inherited from this process.
pub(crate) fn command(
    layout: &Layout,
    python: impl Into<OsString>,
    args: &[OsString],
    env: &impl Environment,
) -> Result<ProcessBuilder> {
    let gyp_main = layout.gyp_main();
    if !gyp_main.is_file() {
        bail!("could not find gyp at `{}`", gyp_main.display());
    }

    let search_path = extend_search_path(
        env.var(PYTHONPATH).as_deref(),
        &[layout.gyp_pylib_dir(), layout.gyp_plugin_dir()],
    )?;

    let mut cmd = cmd!(python, gyp_main);
    cmd.args(args);
    cmd.env(PYTHONPATH, search_path);
    Ok(cmd)
}

/// Appends `dirs` to the `PYTHONPATH`-style list `existing`, skipping
/// directories that are already listed.
fn extend_search_path(existing: Option<&OsStr>, dirs: &[PathBuf]) -> Result<OsString> {
    let mut paths: Vec<PathBuf> = existing
        .map(|existing| env::split_paths(existing).filter(|p| !p.as_os_str().is_empty()).collect())
        .unwrap_or_default();
    for dir in dirs {
        let listed =
            paths.iter().any(|p| p == dir || same_file::is_same_file(p, dir).unwrap_or(false));
        if !listed {
            paths.push(dir.clone());
        }
    }
    env::join_paths(paths).context("failed to build PYTHONPATH")
}

/// Runs the generator and returns its exit code.
///
/// Ctrl-C is left to the generator: this process keeps waiting so that its
/// exit code is still the generator's. Other termination signals are not
/// intercepted.
pub(crate) fn run(cmd: &ProcessBuilder) -> Result<i32> {
    ctrlc::set_handler(|| {}).context("failed to set Ctrl-C handler")?;
    if crate::term::verbose() {
        info!("running {cmd}");
    }
    let status = cmd.status()?;
    cmd.exit_code(status)
}
