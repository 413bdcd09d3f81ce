//! Startup reporting.
//!
//! # Responsibilities
//! - Carry build metadata as an explicit value
//! - Emit the single startup line naming service, build and address

use std::fmt;

use crate::observability::Logger;

const UNKNOWN: &str = "unknown";

/// Build metadata surfaced at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub date: String,
    pub branch: String,
    pub commit: String,
}

impl BuildInfo {
    pub fn new(
        date: impl Into<String>,
        branch: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            branch: branch.into(),
            commit: commit.into(),
        }
    }

    /// Read `BUILD_DATE`, `BUILD_BRANCH` and `BUILD_COMMIT` as set when this
    /// crate was compiled. Missing values read as "unknown".
    pub fn from_build_env() -> Self {
        Self::new(
            option_env!("BUILD_DATE").unwrap_or(UNKNOWN),
            option_env!("BUILD_BRANCH").unwrap_or(UNKNOWN),
            option_env!("BUILD_COMMIT").unwrap_or(UNKNOWN),
        )
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new(UNKNOWN, UNKNOWN, UNKNOWN)
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{date:{}, branch:{}, commit:{}}}",
            self.date, self.branch, self.commit
        )
    }
}

/// Log the startup line.
pub(crate) fn announce(logger: &dyn Logger, name: &str, build: &BuildInfo, address: &str) {
    logger.info(format_args!(
        "{} service with build info {} start listening address:{}",
        name, build, address
    ));
}
