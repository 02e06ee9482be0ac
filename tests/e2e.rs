//! Binary-level tests: exercises the compiled `allium-check` CLI end to end.

use std::fs;
use std::process::Command;

fn run_cli(path: &std::path::Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_allium-check"))
        .arg(path)
        .output()
        .expect("failed to execute allium-check")
}

#[test]
fn exits_zero_and_prints_nothing_for_a_valid_spec() {
    let dir = std::env::temp_dir();
    let path = dir.join("allium_check_valid.allium");
    fs::write(
        &path,
        "entity User { email: Email  status: active | suspended }\n\
         entity Post { author: User }\n\
         rule SuspendUser {\n\
           when: AdminSuspends(user)\n\
           ensures: user.status = suspended\n\
         }",
    )
    .unwrap();

    let output = run_cli(&path);
    fs::remove_file(&path).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).is_empty());
}

#[test]
fn exits_nonzero_and_prints_a_diagnostic_for_an_invalid_spec() {
    let dir = std::env::temp_dir();
    let path = dir.join("allium_check_invalid.allium");
    fs::write(&path, "value Account { profile: Proflie }").unwrap();

    let output = run_cli(&path);
    fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("undefined type 'Proflie'"), "{stderr}");
}

#[test]
fn exits_nonzero_with_an_invalid_arguments_message_when_no_path_is_given() {
    let output = Command::new(env!("CARGO_BIN_EXE_allium-check"))
        .output()
        .expect("failed to execute allium-check");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "), "{stderr}");
    assert!(stderr.contains("Invalid arguments"), "{stderr}");
}

#[test]
fn reports_an_io_error_for_a_missing_file() {
    let output = run_cli(std::path::Path::new("/nonexistent/path/does-not-exist.allium"));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "), "{stderr}");
    assert!(!stderr.contains("I/O error"), "{stderr}");
}
