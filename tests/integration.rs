use std::{env, fs, path::PathBuf, process::Command};

fn run_bin(args: &[&str]) -> std::process::Output {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_molting"));

    Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command")
}

fn assert_success(args: &[&str]) {
    let output = run_bin(args);

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
}

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "[population]\n"
        + "size = 40\n"
        + "spread = 6.0\n"
        + "diff = 1.5\n"
        + "\n"
        + "[sampling]\n"
        + "hour = 0.5\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert_success(&["--sim-dir", test_dir_str, "create"]);
    assert_success(&["--sim-dir", test_dir_str, "create", "--seed", "17"]);
    assert_success(&["--sim-dir", test_dir_str, "create", "--seed", "17"]);

    for run_idx in 0..3 {
        let results_file = test_dir.join(format!("run-{run_idx:04}/results.msgpack"));
        assert!(results_file.is_file(), "missing {results_file:?}");
    }
    assert_eq!(
        fs::read(test_dir.join("run-0001/results.msgpack")).expect("failed to read results"),
        fs::read(test_dir.join("run-0002/results.msgpack")).expect("failed to read results"),
    );

    assert_success(&["--sim-dir", test_dir_str, "analyze"]);

    let analysis = fs::read_to_string(test_dir.join("analysis.toml"))
        .expect("failed to read analysis file");
    assert!(analysis.contains("n_runs = 3"));

    assert_success(&["--sim-dir", test_dir_str, "clean"]);

    assert!(!test_dir.join("run-0000").exists());
    assert!(!test_dir.join("analysis.toml").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn default_config_without_file() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("default_config");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert_success(&["--sim-dir", test_dir_str, "create", "--seed", "1"]);
    assert!(test_dir.join("run-0000/results.msgpack").is_file());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_config_fails() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("invalid_config");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    fs::write(test_dir.join("config.toml"), "[sampling]\nhour = -1.0\n")
        .expect("failed to write config file");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    let output = run_bin(&["--sim-dir", test_dir_str, "create"]);
    assert!(!output.status.success());
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn failed_simulation_leaves_no_run_dir() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("failed_simulation");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    // Valid config, but the molt times span far more sample points than allowed.
    let config_contents = String::new()
        + "[population]\n"
        + "spread = 100000.0\n"
        + "\n"
        + "[sampling]\n"
        + "hour = 0.01\n";
    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    let output = run_bin(&["--sim-dir", test_dir_str, "create", "--seed", "3"]);
    assert!(!output.status.success());
    assert!(!test_dir.join("run-0000").exists());

    assert_success(&["--sim-dir", test_dir_str, "analyze"]);
    let analysis = fs::read_to_string(test_dir.join("analysis.toml"))
        .expect("failed to read analysis file");
    assert!(analysis.contains("n_runs = 0"));

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn help_describes_commands() {
    let output = run_bin(&["--help"]);
    assert!(output.status.success());

    let stdout_str = String::from_utf8_lossy(&output.stdout);
    assert!(stdout_str.contains("molting times"));
    assert!(stdout_str.contains("Summarize power and density peaks"));
}
