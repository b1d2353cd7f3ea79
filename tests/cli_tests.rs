use assert_cmd::Command;

#[test]
fn compiles_a_class_from_stdin_to_stdout() {
    Command::cargo_bin("jackc")
        .unwrap()
        .write_stdin("class Main { function int one() { return 1; } }")
        .assert()
        .success()
        .stdout("function Main.one 0\npush constant 1\nreturn\n");
}

#[test]
fn maps_compile_errors_to_a_failing_exit_status() {
    Command::cargo_bin("jackc")
        .unwrap()
        .write_stdin("class Main { function int broken() { return 1 } }")
        .assert()
        .failure();
}

#[test]
fn writes_to_a_file_when_requested() {
    let dir = std::env::temp_dir().join("jackc-cli-test");
    std::fs::create_dir_all(&dir).unwrap();
    let out = dir.join("Main.vm");

    Command::cargo_bin("jackc")
        .unwrap()
        .arg("-o")
        .arg(&out)
        .write_stdin("class Main { function int one() { return 1; } }")
        .assert()
        .success();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, "function Main.one 0\npush constant 1\nreturn\n");
}
