mod support;

use assert_cmd::Command;
use predicates::str::contains;
use support::{DataDir, DESCRIPTION};

#[test]
fn bcstart_help_works() {
    Command::cargo_bin("bcstart")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("B Corp certification roadmap"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "init", "session", "business", "todo", "area", "file", "summary", "dev",
    ];

    for cmd in subcommands {
        Command::cargo_bin("bcstart")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn init_writes_default_config() {
    let data = DataDir::new();
    data.bare()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("bcstart init: data directory ready"));
    assert!(data.path().join(".bcstart.toml").exists());

    let report = data.json("anyone", &["init"]);
    assert_eq!(report["created_config"], false);
}

#[test]
fn commands_without_a_session_exit_with_user_error() {
    let data = DataDir::new();
    data.bare()
        .args(["business", "list"])
        .assert()
        .code(2)
        .stderr(contains("Authentication required"));
}

#[test]
fn persisted_session_is_used() {
    let data = DataDir::new();
    data.bare()
        .args(["session", "login", "founder"])
        .assert()
        .success();
    data.bare()
        .args(["session", "whoami"])
        .assert()
        .success()
        .stdout(contains("founder"));
    data.bare().args(["session", "logout"]).assert().success();
    data.bare()
        .args(["session", "whoami"])
        .assert()
        .success()
        .stdout(contains("not signed in"));
}

#[test]
fn todo_lifecycle_round_trip() {
    let data = DataDir::new();
    let business = data.json(
        "founder",
        &["business", "create", "Roastery", "--description", DESCRIPTION],
    );
    let business_id = business["id"].as_str().expect("business id").to_string();

    let todo = data.json(
        "founder",
        &[
            "todo",
            "add",
            &business_id,
            "Pay the living wage",
            "--impact",
            "workers",
            "--priority",
            "high",
        ],
    );
    let todo_id = todo["id"].as_str().expect("todo id").to_string();
    assert_eq!(todo["impact"], "Workers");
    assert_eq!(todo["priority"], "P1");
    assert_eq!(todo["status"], "todo");

    let done = data.json("founder", &["todo", "status", &todo_id, "completed"]);
    assert_eq!(done["status"], "done");
    assert!(done["completed_at"].is_string());

    let summaries = data.json("founder", &["summary", &business_id]);
    let workers = &summaries.as_array().expect("summaries")[1];
    assert_eq!(workers["impact"], "Workers");
    assert_eq!(workers["done"], 1);
    assert_eq!(workers["pct"], 100);

    data.json("founder", &["todo", "delete", &todo_id]);
    let binned = data.json("founder", &["todo", "list", &business_id, "--binned"]);
    assert_eq!(binned.as_array().expect("binned").len(), 1);
    data.json("founder", &["todo", "restore", &todo_id]);
    let active = data.json("founder", &["todo", "list", &business_id]);
    assert_eq!(active.as_array().expect("active").len(), 1);
}

#[test]
fn other_users_get_not_found() {
    let data = DataDir::new();
    let business = data.json("owner", &["business", "create", "Roastery"]);
    let business_id = business["id"].as_str().expect("business id").to_string();

    data.bcstart("intruder")
        .args(["todo", "list", &business_id])
        .assert()
        .code(2)
        .stderr(contains("Business not found"));
}

#[test]
fn sub_areas_are_seeded_and_grouped() {
    let data = DataDir::new();
    let business = data.json(
        "founder",
        &["business", "create", "Roastery", "--description", DESCRIPTION],
    );
    let business_id = business["id"].as_str().expect("business id").to_string();

    let custom = data.json(
        "founder",
        &["area", "add", &business_id, "Workers", "Apprentices"],
    );
    assert_eq!(custom["is_user_created"], true);

    let grouping = data.json("founder", &["area", "list", &business_id, "Workers"]);
    let groups = grouping["groups"].as_array().expect("groups");
    assert!(groups.len() > 1);
    assert!(groups
        .iter()
        .any(|g| g["sub_area"]["title"] == "Apprentices"));
}

#[test]
fn reset_is_blocked_unless_enabled() {
    let data = DataDir::new();
    let business = data.json(
        "founder",
        &["business", "create", "Roastery", "--description", DESCRIPTION],
    );
    let business_id = business["id"].as_str().expect("business id").to_string();

    let output = data
        .bcstart("founder")
        .args(["--json", "dev", "reset", &business_id])
        .output()
        .expect("run bcstart");
    assert_eq!(output.status.code(), Some(3));
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["error"]["kind"], "policy_blocked");
    assert_eq!(envelope["error"]["code"], 3);
    assert!(envelope["error"]["error"]
        .as_str()
        .expect("message")
        .contains("disabled"));

    data.write_config("[dev]\nallow_reset = true\n");
    let outcome = data.json("founder", &["dev", "reset", &business_id]);
    assert!(!outcome["todos"].as_array().expect("todos").is_empty());
    assert_eq!(
        outcome["impact_summaries"].as_array().expect("summaries").len(),
        5
    );
}

#[test]
fn files_map_to_one_task() {
    let data = DataDir::new();
    let business = data.json(
        "founder",
        &["business", "create", "Roastery", "--description", DESCRIPTION],
    );
    let business_id = business["id"].as_str().expect("business id").to_string();
    let first = data.json("founder", &["todo", "add", &business_id, "Supplier code"]);
    let second = data.json("founder", &["todo", "add", &business_id, "Privacy policy"]);
    let first_id = first["id"].as_str().expect("id").to_string();
    let second_id = second["id"].as_str().expect("id").to_string();

    let upload_path = data.path().join("code.md");
    std::fs::write(&upload_path, "# Supplier code of conduct\n").expect("write upload");
    let record = data.json(
        "founder",
        &["file", "upload", &business_id, upload_path.to_str().expect("path")],
    );
    let file_id = record["id"].as_str().expect("file id").to_string();
    assert_eq!(record["name"], "code.md");

    data.json("founder", &["file", "map", &first_id, &file_id]);
    data.bcstart("founder")
        .args(["file", "map", &second_id, &file_id])
        .assert()
        .code(3)
        .stderr(contains("already mapped"));

    let files = data.json("founder", &["file", "task", &first_id]);
    assert_eq!(files.as_array().expect("files").len(), 1);
}
