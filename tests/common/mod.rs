//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// The binary, isolated from the user's config files and environment.
///
/// Runs in `workdir`, with HOME and XDG_CONFIG_HOME pointing inside it.
pub fn healthmetrix_cmd(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("healthmetrix").unwrap();
    cmd.current_dir(workdir)
        .env("HOME", workdir)
        .env("XDG_CONFIG_HOME", workdir.join(".config"))
        .env_remove("RUST_LOG");

    for key in [
        "HEALTHMETRIX_CONFIG",
        "HEALTHMETRIX_LOG_LEVEL",
        "HEALTHMETRIX_LOG_FILE",
        "HEALTHMETRIX_LOG_JSON",
        "HEALTHMETRIX_SAMPLE_WINDOW_SECS",
        "HEALTHMETRIX_MOUNT_POINT",
        "HEALTHMETRIX_SHOW_PROGRESS",
    ] {
        cmd.env_remove(key);
    }

    cmd
}

/// `healthmetrix run` with a short window and no progress bar
pub fn quick_run(workdir: &Path) -> Command {
    let mut cmd = healthmetrix_cmd(workdir);
    cmd.args(["run", "--no-progress", "--window", "0.1"]);
    cmd
}
