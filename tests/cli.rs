use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

#[cfg(target_os = "linux")]
#[test]
fn cli_fails_cleanly_without_a_display() {
    let mut cmd = Command::cargo_bin("shadow-mapping").expect("binary exists");
    cmd.env_remove("DISPLAY")
        .env_remove("WAYLAND_DISPLAY")
        .env_remove("WAYLAND_SOCKET");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("Error:"))
        .stderr(contains("failed to initialize"));
}

#[cfg(target_os = "linux")]
#[test]
fn missing_shader_dir_does_not_change_the_failure() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("shadow-mapping").expect("binary exists");
    cmd.env_remove("DISPLAY")
        .env_remove("WAYLAND_DISPLAY")
        .env_remove("WAYLAND_SOCKET")
        .env("SHADOW_MAPPING_SHADER_DIR", dir.path().join("nowhere"));
    cmd.assert()
        .failure()
        .stderr(contains("failed to initialize event loop"));
}
