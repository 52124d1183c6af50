//! Build metadata.
//!
//! `GIT_COMMIT` and `BUILD_DATE` are read from the build environment when set
//! (e.g. by CI); otherwise they report `unknown`.

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const COMMIT: &str = match option_env!("GIT_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};

pub const BUILD_DATE: &str = match option_env!("BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

/// Version triple reported by `/` and `/admin/status`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub build_date: &'static str,
}

pub fn current() -> BuildInfo {
    BuildInfo {
        version: VERSION,
        commit: COMMIT,
        build_date: BUILD_DATE,
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "version {} (commit {}, built {})",
            self.version, self.commit, self.build_date
        )
    }
}
