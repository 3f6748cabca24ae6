// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::{fmt, path::PathBuf};

use anyhow::Result;

use crate::{fs, layout::Layout, term};

/// An MSVS solution generated by the `msvs-ninja` generator builds its
/// `build_all` target by shelling out to ninja.
const NINJA_DELEGATION: &[u8] = b"call ninja.exe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuildSystem {
    Ninja,
    Msvs,
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ninja => "ninja",
            Self::Msvs => "MSVS",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reason {
    /// `out/Debug/build.ninja` does not exist.
    NoNinjaOutput,
    /// `out/Debug/build.ninja` is at least as new as the solution.
    NinjaOutputNewer,
    /// The solution is newer, but its `build_all` project invokes ninja.
    SolutionDelegatesToNinja,
    /// The solution is newer and builds by itself.
    SolutionNewer,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoNinjaOutput => "no ninja build files were found",
            Self::NinjaOutputNewer => "ninja build files are newer than the MSVS solution",
            Self::SolutionDelegatesToNinja => "the MSVS solution delegates to ninja",
            Self::SolutionNewer => "the MSVS solution is newer than the ninja build files",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Detection {
    pub(crate) build_system: BuildSystem,
    pub(crate) reason: Reason,
}

/// The source tree is in a state the detection relies on never happening.
#[derive(Debug)]
pub(crate) struct AssertionFailure {
    msg: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "assertion failed: {}", self.msg)
    }
}

impl std::error::Error for AssertionFailure {}

/// Determines which build system produced the live build output.
///
/// There is no authoritative record of this, so it is inferred from the
/// modification times of the ninja files and the MSVS solution, falling back
/// to inspecting the solution's `build_all` project.
pub(crate) fn detect(layout: &Layout) -> Result<Detection> {
    let reason = decide(layout)?;
    let build_system = match reason {
        Reason::NinjaOutputNewer | Reason::SolutionDelegatesToNinja => BuildSystem::Ninja,
        Reason::NoNinjaOutput | Reason::SolutionNewer => BuildSystem::Msvs,
    };
    if term::verbose() {
        info!("using {build_system} build output: {reason}");
    }
    Ok(Detection { build_system, reason })
}

fn decide(layout: &Layout) -> Result<Reason> {
    let build_ninja = layout.ninja_marker();
    if !build_ninja.exists() {
        return Ok(Reason::NoNinjaOutput);
    }

    if fs::modified(&build_ninja) >= fs::modified(layout.solution()) {
        return Ok(Reason::NinjaOutputNewer);
    }

    // The solution is newer than an existing file here, so it exists and
    // `build_all` must be part of it.
    let build_all = layout.build_all_project();
    if !build_all.exists() {
        return Err(AssertionFailure {
            msg: format!(
                "`{}` exists but its `{}` project does not",
                layout.solution().display(),
                build_all.display()
            ),
        }
        .into());
    }
    let contents = fs::read(&build_all)?;
    if contents.windows(NINJA_DELEGATION.len()).any(|w| w == NINJA_DELEGATION) {
        return Ok(Reason::SolutionDelegatesToNinja);
    }

    Ok(Reason::SolutionNewer)
}

/// Returns `true` if the ninja build is the live one.
pub(crate) fn uses_ninja_build(layout: &Layout) -> Result<bool> {
    Ok(detect(layout)?.build_system == BuildSystem::Ninja)
}

/// Returns the output directory of the live build.
pub(crate) fn active_build_dir(layout: &Layout) -> Result<PathBuf> {
    Ok(if uses_ninja_build(layout)? { layout.ninja_build_dir() } else { layout.msvs_build_dir() })
}
