//! # Cache Path Resolver
//!
//! Static library defaults for cache directory resolution.

use std::{
    env,
    path::{Path, PathBuf},
};

use directories_next::ProjectDirs;

use crate::path_utils::expand_path;

/// Static configuration for application path resolution.
pub struct PathResolver {
    /// The qualifier for [`ProjectDirs`].
    pub qualifier: &'static str,

    /// The organization for [`ProjectDirs`].
    pub organization: &'static str,

    /// The application for [`ProjectDirs`].
    pub application: &'static str,

    /// The resolution order for cache directories environment variables.
    pub cache_env_vars: &'static [&'static str],
}

impl PathResolver {
    /// Get the [`ProjectDirs`] for this config.
    pub fn project_dirs(&self) -> Option<ProjectDirs> {
        ProjectDirs::from(self.qualifier, self.organization, self.application)
    }

    /// Resolve the cache directory for this config.
    ///
    /// Resolution Order:
    /// 1. `path`, if present.
    /// 2. ``env[$VAR]`` for each `self.cache_env_vars`; in order.
    /// 3. `self.project_dirs().cache_dir()`, if present.
    /// 4. `None`
    ///
    /// Explicit paths and environment values are `~` / `$VAR` expanded.
    ///
    /// ## Project Dirs Behavior
    ///
    /// |Platform | Value                                                                 | Example                          |
    /// | ------- | --------------------------------------------------------------------- | -------------------------------- |
    /// | Linux   | `$XDG_CACHE_HOME`/`_project_path_` or `$HOME`/.cache/`_project_path_` | /home/alice/.cache/fedstack      |
    /// | macOS   | `$HOME`/Library/Caches/`_project_path_`                               | /Users/Alice/Library/Caches/...  |
    /// | Windows | `{FOLDERID_LocalAppData}`\\`_project_path_`\\cache                    | C:\Users\Alice\AppData\Local\... |
    pub fn resolve_cache_dir<P: AsRef<Path>>(
        &self,
        path: Option<P>,
    ) -> Option<PathBuf> {
        if let Some(path) = path.as_ref() {
            return Some(expand_path(path));
        }

        for env_var in self.cache_env_vars {
            if let Ok(value) = env::var(env_var) {
                return Some(expand_path(value));
            }
        }

        self.project_dirs()
            .map(|pds| pds.cache_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const CACHE_ENV1: &str = "_FEDSTACK_PATH_CACHE_ENV1";
    const CACHE_ENV2: &str = "_FEDSTACK_PATH_CACHE_ENV2";

    const TEST_CONFIG: PathResolver = PathResolver {
        qualifier: "io",
        organization: "crates",
        application: "fedstack-test",
        cache_env_vars: &[CACHE_ENV1, CACHE_ENV2],
    };

    #[test]
    #[serial]
    fn test_resolution_order() {
        let pds = TEST_CONFIG
            .project_dirs()
            .expect("failed to get project dirs");
        let no_path: Option<PathBuf> = None;

        unsafe {
            env::remove_var(CACHE_ENV1);
            env::remove_var(CACHE_ENV2);
        }

        let user_dir = PathBuf::from("/tmp/fedstack/user");
        assert_eq!(
            TEST_CONFIG.resolve_cache_dir(Some(&user_dir)),
            Some(user_dir.clone())
        );
        assert_eq!(
            TEST_CONFIG.resolve_cache_dir(no_path.clone()),
            Some(pds.cache_dir().to_path_buf())
        );

        unsafe {
            env::set_var(CACHE_ENV2, "/tmp/fedstack/env.2");
        }
        assert_eq!(
            TEST_CONFIG.resolve_cache_dir(no_path.clone()),
            Some(PathBuf::from("/tmp/fedstack/env.2"))
        );

        unsafe {
            env::set_var(CACHE_ENV1, "/tmp/fedstack/env.1");
        }
        assert_eq!(
            TEST_CONFIG.resolve_cache_dir(no_path.clone()),
            Some(PathBuf::from("/tmp/fedstack/env.1"))
        );

        // User overrides still win.
        assert_eq!(
            TEST_CONFIG.resolve_cache_dir(Some(&user_dir)),
            Some(user_dir)
        );

        unsafe {
            env::remove_var(CACHE_ENV1);
            env::remove_var(CACHE_ENV2);
        }
    }
}
