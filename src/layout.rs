// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

const PROJECT_DIR: &str = "syzygy";
const GYP_ENV_FILE: &str = "syzygy.gyp_env";
const SOLUTION_FILE: &str = "syzygy.sln";
const BUILD_ALL_PROJECT: &str = "build_all.vcxproj";
const NINJA_BUILD_DIR: &str = "out";
const MSVS_BUILD_DIR: &str = "build";
const NINJA_MARKER_CONFIGURATION: &str = "Debug";
const NINJA_MARKER_FILE: &str = "build.ninja";

/// Well-known paths of a source tree, all derived from the source root
/// (the directory that contains `syzygy/`, `tools/` and `out/`).
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    src_dir: PathBuf,
}

impl Layout {
    pub(crate) fn new(src_dir: impl Into<PathBuf>) -> Self {
        Self { src_dir: src_dir.into() }
    }

    /// Finds the source root by walking up from `cwd` until a directory
    /// containing the project directory is found.
    pub(crate) fn find_for_wd(cwd: &Path) -> Result<Self> {
        for current in cwd.ancestors() {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self::new(current));
            }
        }

        bail!(
            "could not find `{PROJECT_DIR}` directory in `{}` or any parent directory",
            cwd.display()
        )
    }

    pub(crate) fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub(crate) fn project_dir(&self) -> PathBuf {
        self.src_dir.join(PROJECT_DIR)
    }

    pub(crate) fn solution(&self) -> PathBuf {
        self.project_dir().join(SOLUTION_FILE)
    }

    pub(crate) fn build_all_project(&self) -> PathBuf {
        self.project_dir().join(BUILD_ALL_PROJECT)
    }

    pub(crate) fn ninja_build_dir(&self) -> PathBuf {
        self.src_dir.join(NINJA_BUILD_DIR)
    }

    pub(crate) fn ninja_marker(&self) -> PathBuf {
        self.ninja_build_dir().join(NINJA_MARKER_CONFIGURATION).join(NINJA_MARKER_FILE)
    }

    pub(crate) fn msvs_build_dir(&self) -> PathBuf {
        self.src_dir.join(MSVS_BUILD_DIR)
    }

    pub(crate) fn gyp_env_file(&self) -> PathBuf {
        self.src_dir.join(GYP_ENV_FILE)
    }

    pub(crate) fn gyp_dir(&self) -> PathBuf {
        self.src_dir.join("tools").join("gyp")
    }

    /// The gyp python package.
    pub(crate) fn gyp_pylib_dir(&self) -> PathBuf {
        self.gyp_dir().join("pylib")
    }

    pub(crate) fn gyp_main(&self) -> PathBuf {
        self.gyp_dir().join("gyp_main.py")
    }

    /// Directory holding the gyp plugins that `common.gypi` and `base.gyp` call into.
    /// This is the same directory MSVS builds write to.
    pub(crate) fn gyp_plugin_dir(&self) -> PathBuf {
        self.msvs_build_dir()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::Layout;

    #[test]
    fn find_for_wd() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("syzygy").join("agent").join("asan");
        fs::create_dir_all(&nested).unwrap();

        let layout = Layout::find_for_wd(&nested).unwrap();
        assert_eq!(layout.src_dir(), tmp.path());
        assert_eq!(layout.solution(), tmp.path().join("syzygy").join("syzygy.sln"));
        assert_eq!(layout.ninja_marker(), tmp.path().join("out").join("Debug").join("build.ninja"));
        assert_eq!(layout.gyp_env_file(), tmp.path().join("syzygy.gyp_env"));
    }

    #[test]
    fn find_for_wd_without_project() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Layout::find_for_wd(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("could not find `syzygy` directory"), "{err}");
    }
}
