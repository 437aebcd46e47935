//! Build information embedded by `build.rs`

use std::fmt;

use serde::Serialize;

/// Build information embedded at compile time
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Short git commit hash ("unknown" outside a checkout)
    pub git_hash: &'static str,
    pub git_branch: &'static str,
    git_dirty_str: &'static str,
    pub build_timestamp: &'static str,
    /// Target triple (e.g., x86_64-unknown-linux-gnu)
    pub target: &'static str,
    pub host: &'static str,
    pub profile: &'static str,
    pub rustc_version: &'static str,
    /// Comma-separated cargo features ("" when none)
    features_str: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("HEALTHMETRIX_GIT_HASH"),
            git_branch: env!("HEALTHMETRIX_GIT_BRANCH"),
            git_dirty_str: env!("HEALTHMETRIX_GIT_DIRTY"),
            build_timestamp: env!("HEALTHMETRIX_BUILD_TIMESTAMP"),
            target: env!("HEALTHMETRIX_TARGET"),
            host: env!("HEALTHMETRIX_HOST"),
            profile: env!("HEALTHMETRIX_PROFILE"),
            rustc_version: env!("HEALTHMETRIX_RUSTC_VERSION"),
            features_str: env!("HEALTHMETRIX_FEATURES"),
        }
    }

    pub fn git_dirty(&self) -> bool {
        self.git_dirty_str == "true"
    }

    /// Enabled cargo features
    pub fn features(&self) -> Vec<&'static str> {
        self.features_str
            .split(',')
            .filter(|f| !f.is_empty())
            .collect()
    }

    /// Version with commit, e.g. "0.1.0-abc12345" or "0.1.0-abc12345-dirty"
    pub fn full_version(&self) -> String {
        let dirty = if self.git_dirty() { "-dirty" } else { "" };
        format!("{}-{}{}", self.version, self.git_hash, dirty)
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let features = self.features();

        writeln!(f, "{} {}", self.name, self.full_version())?;
        writeln!(f)?;
        writeln!(f, "  Commit:   {} ({})", self.git_hash, self.git_branch)?;
        writeln!(f, "  Built:    {} [{}]", self.build_timestamp, self.profile)?;
        writeln!(f, "  Target:   {}", self.target)?;
        writeln!(f, "  Host:     {}", self.host)?;
        writeln!(f, "  Compiler: {}", self.rustc_version)?;
        if features.is_empty() {
            writeln!(f, "  Features: none")
        } else {
            writeln!(f, "  Features: {}", features.join(", "))
        }
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo::current()
}

/// Print version information to stdout
pub fn print_version() {
    print!("{}", build_info());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_exists() {
        let info = build_info();
        assert_eq!(info.name, "healthmetrix");
        assert!(!info.version.is_empty());
        assert!(!info.git_hash.is_empty());
    }

    #[test]
    fn test_full_version_format() {
        let info = build_info();
        let full = info.full_version();
        assert!(full.starts_with(info.version));
        assert!(full.contains(info.git_hash));
        assert_eq!(full.ends_with("-dirty"), info.git_dirty());
    }

    #[test]
    fn test_display_format() {
        let display = build_info().to_string();
        assert!(display.starts_with("healthmetrix "));
        assert!(display.contains("Commit:"));
        assert!(display.contains("Target:"));
        assert!(display.contains("Features:"));
    }

    #[test]
    fn test_gpu_feature_listed() {
        let enabled = build_info().features().contains(&"gpu");
        assert_eq!(enabled, cfg!(feature = "gpu"));
    }
}
