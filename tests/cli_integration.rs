//! Integration tests for the whawty-groups binary.
//!
//! Each test runs against its own store in a temporary directory, with an
//! empty config file so the host's configuration never leaks in.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Isolated store and config for one test.
struct TestEnv {
    temp: TempDir,
}

impl TestEnv {
    /// Create an initialized store.
    fn new() -> Self {
        let env = Self::uninitialized();
        env.cmd().arg("init").assert().success();
        env
    }

    fn uninitialized() -> Self {
        let temp = TempDir::new().unwrap();
        temp.child("store").create_dir_all().unwrap();
        temp.child("config.toml").write_str("").unwrap();
        Self { temp }
    }

    /// Command with `--store` and `--config` pointing into the test dir.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("whawty-groups").unwrap();
        cmd.env_remove("WHAWTY_GROUPS_DEBUG")
            .env_remove("RUST_LOG")
            .arg("--store")
            .arg(self.temp.child("store").path())
            .arg("--config")
            .arg(self.temp.child("config.toml").path());
        cmd
    }

    fn run(&self, args: &[&str]) {
        self.cmd().args(args).assert().success();
    }
}

#[test]
fn help_flag_works() {
    Command::cargo_bin("whawty-groups")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("group"));
}

#[test]
fn init_creates_layout() {
    let env = TestEnv::new();
    env.temp.child("store/users").assert(predicate::path::is_dir());
    env.temp.child("store/groups").assert(predicate::path::is_dir());
    env.cmd()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn init_on_non_empty_dir_fails() {
    let env = TestEnv::uninitialized();
    env.temp.child("store/foo").touch().unwrap();
    env.cmd()
        .arg("init")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("error:"))
        .stderr(predicate::str::contains("not empty"));

    std::fs::remove_file(env.temp.child("store/foo").path()).unwrap();
    env.run(&["init"]);
    env.run(&["check"]);
}

#[test]
fn commands_fail_on_uninitialized_store() {
    let env = TestEnv::uninitialized();
    env.cmd()
        .args(["user", "add", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt store layout"));
}

#[test]
fn missing_store_option_is_reported() {
    let temp = TempDir::new().unwrap();
    temp.child("config.toml").write_str("").unwrap();
    Command::cargo_bin("whawty-groups")
        .unwrap()
        .arg("--config")
        .arg(temp.child("config.toml").path())
        .args(["user", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no store configured"));
}

#[test]
fn store_from_config_file() {
    let env = TestEnv::new();
    let store = env.temp.child("store");
    env.temp
        .child("other.toml")
        .write_str(&format!("store = {:?}\n", store.path().display().to_string()))
        .unwrap();

    Command::cargo_bin("whawty-groups")
        .unwrap()
        .arg("--config")
        .arg(env.temp.child("other.toml").path())
        .args(["user", "add", "alice"])
        .assert()
        .success();
    store.child("users/alice").assert(predicate::path::is_file());
}

#[test]
fn user_lifecycle() {
    let env = TestEnv::new();
    env.cmd()
        .args(["user", "add", "hugo@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added user hugo@example.com"));
    env.cmd()
        .args(["user", "list"])
        .assert()
        .success()
        .stdout("hugo@example.com\n");

    env.cmd()
        .args(["user", "add", "hugo@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    env.run(&["user", "remove", "hugo@example.com"]);
    env.cmd().args(["user", "list"]).assert().success().stdout("");
    env.cmd()
        .args(["user", "remove", "hugo@example.com"])
        .assert()
        .success()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn invalid_name_rejected() {
    let env = TestEnv::new();
    env.cmd()
        .args(["user", "add", "@hugo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid name '@hugo'"));
    env.temp.child("store/users/@hugo").assert(predicate::path::missing());
}

#[test]
fn membership_and_cycle_rejection() {
    let env = TestEnv::new();
    env.run(&["user", "add", "alice"]);
    for g in ["a", "b", "c"] {
        env.run(&["group", "add", g]);
    }
    env.run(&["group", "add-user", "c", "alice"]);
    env.run(&["group", "add-group", "a", "b"]);
    env.run(&["group", "add-group", "b", "c"]);

    env.cmd()
        .args(["group", "add-group", "c", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle"));

    env.cmd()
        .args(["group", "members", "a", "--effective"])
        .assert()
        .success()
        .stdout("alice\n");
    env.cmd()
        .args(["group", "members", "b"])
        .assert()
        .success()
        .stdout("group:c\n");
}

#[test]
fn unknown_member_rejected() {
    let env = TestEnv::new();
    env.run(&["group", "add", "staff"]);
    env.cmd()
        .args(["group", "add-user", "staff", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown user 'ghost'"));
}

#[test]
fn remove_user_cascades() {
    let env = TestEnv::new();
    env.run(&["user", "add", "alice"]);
    env.run(&["group", "add", "staff"]);
    env.run(&["group", "add-user", "staff", "alice"]);
    env.run(&["user", "remove", "alice"]);

    env.cmd()
        .args(["group", "members", "staff"])
        .assert()
        .success()
        .stdout("");
    env.run(&["verify"]);
}

#[test]
fn show_json_output() {
    let env = TestEnv::new();
    env.run(&["user", "add", "alice"]);
    env.run(&["group", "add", "staff"]);
    env.run(&["group", "add-user", "staff", "alice"]);
    env.run(&["group", "add", "all"]);
    env.run(&["group", "add-group", "all", "staff"]);

    let output = env
        .cmd()
        .args(["group", "show", "staff", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["name"], "staff");
    assert_eq!(value["members"][0]["kind"], "user");
    assert_eq!(value["members"][0]["name"], "alice");
    assert_eq!(value["member_of"], serde_json::json!(["all"]));
    assert_eq!(value["effective_member_of"], serde_json::json!(["all"]));

    let output = env
        .cmd()
        .args(["user", "show", "alice", "--json"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["groups"], serde_json::json!(["staff"]));
    assert_eq!(value["effective_groups"], serde_json::json!(["all", "staff"]));

    env.cmd()
        .args(["user", "show", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("effective groups:"));
}

#[test]
fn quiet_suppresses_messages() {
    let env = TestEnv::new();
    env.cmd()
        .args(["-q", "user", "add", "alice"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn verify_reports_dangling_member() {
    let env = TestEnv::new();
    env.run(&["group", "add", "staff"]);
    env.temp
        .child("store/groups/staff/members")
        .write_str("members:\n- kind: user\n  name: ghost\n")
        .unwrap();

    env.cmd()
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing member user:ghost"))
        .stderr(predicate::str::contains("1 issue"));
}

#[test]
fn gc_removes_old_leftovers() {
    let env = TestEnv::new();
    env.temp
        .child("store/.tmp/0000.staged")
        .write_str("partial")
        .unwrap();
    // Let the leftover age past the one-second threshold.
    std::thread::sleep(std::time::Duration::from_millis(1100));

    env.cmd()
        .args(["gc", "--max-age", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1"));
    env.temp
        .child("store/.tmp/0000.staged")
        .assert(predicate::path::missing());
}

#[test]
fn debug_logs_to_stderr() {
    let env = TestEnv::new();
    env.cmd()
        .args(["--debug", "user", "add", "alice"])
        .assert()
        .success()
        .stderr(predicate::str::contains("added user"))
        .stderr(predicate::str::contains("loaded configuration"));
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("whawty-groups")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("whawty-groups"));
}
