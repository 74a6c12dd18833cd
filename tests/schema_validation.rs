use jsonschema::validator_for;
use test_support::weekly_cmd;

const SCHEMA: &str = "activity-report.schema.json";

fn compile_schema() -> jsonschema::Validator {
  let schema = test_support::read_schema(SCHEMA);
  validator_for(&schema).expect("compile schema")
}

#[test]
fn collected_report_conforms_to_schema() {
  let out = weekly_cmd("github_week.json")
    .args(["--repos", "acme/api,acme/web", "--format", "json", "--month", "2025-08"])
    .output()
    .unwrap();

  assert!(out.status.success());
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

  compile_schema().validate(&v).expect("schema validation failed for collected report");
}

#[test]
fn saved_report_conforms_to_schema() {
  let td = test_support::tempdir();
  let path = td.path().join("report.json");

  weekly_cmd("github_week.json")
    .args(["--repos", "acme/web", "--out", path.to_str().unwrap()])
    .assert()
    .success();

  let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
  compile_schema().validate(&v).expect("schema validation failed for saved report");
}

#[test]
fn empty_report_conforms_to_schema() {
  let out = weekly_cmd("github_week.json").args(["--format", "json"]).output().unwrap();
  assert!(out.status.success());

  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(v["repositories"], serde_json::json!([]));
  compile_schema().validate(&v).expect("schema validation failed for empty report");
}

#[test]
fn derived_aggregates_are_rejected() {
  let mut v: serde_json::Value = serde_json::json!({
    "repositories": [],
    "date_range_start": null,
    "date_range_end": null
  });
  assert!(compile_schema().is_valid(&v));

  v["total_commits"] = serde_json::json!(0);
  assert!(!compile_schema().is_valid(&v));
}
