use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn lists_builtin_check_types() {
    let mut cmd = Command::cargo_bin("report-card-cli").unwrap();
    cmd.arg("list-checks")
        .assert()
        .success()
        .stdout(contains("7 check type(s) available"))
        .stdout(contains("FileMatchesJSONSchema"))
        .stdout(contains("schema-path"))
        .stdout(contains("aka CheckNodeDependencies"));
}

#[test]
fn lists_check_types_as_json() {
    let mut cmd = Command::cargo_bin("report-card-cli").unwrap();
    let output = cmd
        .args(["list-checks", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let tags: Vec<_> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["tag"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tags.len(), 7);
    assert!(tags.contains(&"BaseImageWhitelist".to_string()));
}
