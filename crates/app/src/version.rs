//! Build metadata baked in by `build.rs`

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub repo_version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub build_target: Option<&'static str>,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        repo_version: env!("REPO_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        build_target: option_env!("BUILD_TARGET"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "postgate {} ({})", self.version, self.repo_version)?;
        writeln!(f, "  profile:  {}", self.build_profile)?;
        writeln!(f, "  features: {}", self.build_features)?;
        writeln!(f, "  built:    {}", self.build_timestamp)?;
        if let Some(target) = self.build_target {
            writeln!(f, "  target:   {}", target)?;
        }
        write!(f, "  rustc:    {}", self.rust_version)
    }
}
