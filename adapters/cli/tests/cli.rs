use std::process::{Command, Output};

fn gridwalk(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gridwalk"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run gridwalk binary")
}

fn stdout_of(args: &[&str]) -> String {
    let output = gridwalk(args);
    assert!(
        output.status.success(),
        "gridwalk {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is utf-8")
}

#[test]
fn to_grid_keeps_fractional_coordinates() {
    assert_eq!(stdout_of(&["to-grid", "2.4", "0", "3.7"]), "2.400 0.000 3.700\n");
}

#[test]
fn to_world_accepts_negative_coordinates() {
    assert_eq!(stdout_of(&["to-world", "-2", "0", "1.5"]), "-2.000 0.000 1.500\n");
}

#[test]
fn snapshot_output_can_be_inspected() {
    let encoded = stdout_of(&["snapshot", "--ticks", "40"]);
    assert!(encoded.starts_with("grid:v1:"));

    let inspected = stdout_of(&["inspect", encoded.trim()]);
    assert!(inspected.contains("occupied: 2"), "unexpected output: {inspected}");
}

#[test]
fn missing_explicit_config_fails() {
    let output = gridwalk(&["--config", "does-not-exist.toml", "to-grid", "0", "0", "0"]);
    assert!(!output.status.success());
}

#[test]
fn inspect_rejects_foreign_strings() {
    let output = gridwalk(&["inspect", "tiles:v1:AAAA"]);
    assert!(!output.status.success());
}

#[test]
fn inspect_rejects_trailing_segments() {
    let encoded = stdout_of(&["snapshot", "--ticks", "4"]);
    let tampered = format!("{}:extra", encoded.trim());
    let output = gridwalk(&["inspect", tampered.as_str()]);
    assert!(!output.status.success());
}
