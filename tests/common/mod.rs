#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PATTERN_ID: &str = "https://calm.example/patterns/conference-signup.json";

pub struct TestEnv {
    _tmp: TempDir,
    pub root: PathBuf,
    pub home: PathBuf,
    pub pattern: PathBuf,
    pub valid_architecture: PathBuf,
    pub invalid_architecture: PathBuf,
    pub warning_architecture: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().to_path_buf();
        let home = root.join("home");
        fs::create_dir_all(&home).expect("create isolated home");

        let pattern = write_json(&root.join("pattern.json"), &pattern());
        let valid_architecture =
            write_json(&root.join("architecture.json"), &architecture());

        let mut invalid = architecture();
        invalid["nodes"][2]["node-type"] = json!("service");
        push_monitoring_node(&mut invalid);
        let invalid_architecture = write_json(&root.join("invalid-architecture.json"), &invalid);

        let mut warning = architecture();
        push_monitoring_node(&mut warning);
        let warning_architecture = write_json(&root.join("warning-architecture.json"), &warning);

        Self {
            _tmp: tmp,
            root,
            home,
            pattern,
            valid_architecture,
            invalid_architecture,
            warning_architecture,
        }
    }

    /// Places `value` where the loader keeps its copy of `url`.
    pub fn seed_cache(&self, url: &str, value: &Value) -> PathBuf {
        let key = hex::encode(Sha256::digest(url.as_bytes()));
        write_json(
            &self
                .home
                .join(".cache/calm/documents")
                .join(format!("{}.json", key)),
            value,
        )
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("calm");
        cmd.env("HOME", &self.home)
            .env_remove("CALM_CONFIG")
            .env_remove("CALM_LOG")
            .current_dir(&self.root);
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    /// Runs `validate` and returns the parsed outcome along with the exit code.
    pub fn validate(&self, args: &[&str]) -> (Value, i32) {
        let mut cmd = self.cmd();
        let output = cmd.arg("validate").args(args).output().expect("run calm");
        let outcome = serde_json::from_slice(&output.stdout).expect("validation outcome json");
        (outcome, output.status.code().unwrap_or(-1))
    }
}

pub fn s(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

pub fn write_json(path: &Path, value: &Value) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, serde_json::to_string_pretty(value).expect("serialize fixture"))
        .expect("write fixture");
    path.to_path_buf()
}

fn node_item(id: &str, node_type: &str, name: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "unique-id": {"const": id},
            "node-type": {"const": node_type},
            "name": {"const": name},
            "description": {"type": "string"}
        },
        "required": ["unique-id", "node-type", "name", "description"]
    })
}

fn connects_item(id: &str, source: &str, destination: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "unique-id": {"const": id},
            "relationship-type": {"const": {"connects": {
                "source": {"node": source},
                "destination": {"node": destination}
            }}},
            "protocol": {"type": "string"}
        },
        "required": ["unique-id", "relationship-type"]
    })
}

pub fn pattern() -> Value {
    json!({
        "$id": PATTERN_ID,
        "title": "Conference Signup Pattern",
        "type": "object",
        "properties": {
            "nodes": {
                "type": "array",
                "prefixItems": [
                    node_item("frontend", "webclient", "Web Frontend"),
                    node_item("conference-service", "service", "Conference Service"),
                    node_item("attendees-db", "database", "Attendees Store")
                ]
            },
            "relationships": {
                "type": "array",
                "prefixItems": [
                    connects_item("frontend-to-service", "frontend", "conference-service"),
                    connects_item("service-to-db", "conference-service", "attendees-db")
                ]
            }
        },
        "required": ["nodes", "relationships"]
    })
}

pub fn architecture() -> Value {
    json!({
        "name": "Conference Signup",
        "nodes": [
            {"unique-id": "frontend", "node-type": "webclient", "name": "Web Frontend",
             "description": "Signup page"},
            {"unique-id": "conference-service", "node-type": "service", "name": "Conference Service",
             "description": "Registers attendees"},
            {"unique-id": "attendees-db", "node-type": "database", "name": "Attendees Store",
             "description": "Stores attendees"}
        ],
        "relationships": [
            {"unique-id": "frontend-to-service", "protocol": "HTTPS",
             "relationship-type": {"connects": {
                "source": {"node": "frontend"}, "destination": {"node": "conference-service"}}}},
            {"unique-id": "service-to-db", "protocol": "JDBC",
             "relationship-type": {"connects": {
                "source": {"node": "conference-service"}, "destination": {"node": "attendees-db"}}}}
        ],
        "flows": [
            {"unique-id": "signup", "name": "Attendee Signup", "transitions": [
                {"relationship-unique-id": "frontend-to-service", "sequence-number": 1,
                 "description": "Submit form"},
                {"relationship-unique-id": "service-to-db", "sequence-number": 2,
                 "description": "Store attendee"}
            ]}
        ]
    })
}

fn push_monitoring_node(arch: &mut Value) {
    arch["nodes"]
        .as_array_mut()
        .expect("nodes array")
        .push(json!({"unique-id": "monitoring", "node-type": "service", "name": "Monitoring",
                     "description": "Collects metrics"}));
}
