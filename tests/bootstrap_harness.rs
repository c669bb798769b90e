use std::io::{Cursor, Write};

use memtierd::component::{ComponentKind, Registry};
use memtierd::harness::{Harness, InputMode, Session, StreamReader};
use memtierd::{bootstrap, MemtierError};

fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("memtierd")
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const CONFIG: &str = r#"
policy:
  name: noop
  config:
    age: 10
routines:
  - name: noop-routine
  - name: heartbeat
    config:
      interval_ms: 20
"#;

#[tokio::test]
async fn file_to_running_system_to_literal_harness() {
    let file = write_config(".yaml", CONFIG);
    let prepared = bootstrap::prepare_from_file(file.path(), &Registry::builtin()).unwrap();
    assert_eq!(prepared.policy_config_json().unwrap(), r#"{"age":10}"#);

    let system = prepared.start().unwrap();
    assert_eq!(system.routines.len(), 2);

    let commands = "get policy\nget routines\nroutine 2 state\nquit";
    let mode = InputMode::Literal(commands.to_string());
    let mut session = Session::for_mode(&mode);
    session.bind_system(system);

    let mut harness = Harness::new(session, StreamReader::new(Cursor::new(commands)), Vec::new());
    let summary = harness.run().unwrap();
    assert_eq!(summary.commands, 4);
    assert_eq!(summary.failed, 1);

    let out = String::from_utf8(harness.into_output()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "get policy");
    assert_eq!(lines[1], "name: noop");
    assert!(out.contains("\n1    noop-routine"), "{out}");
    assert!(out.contains("\n2    heartbeat"), "{out}");
    assert!(out.contains("routine 2 state\nrunning\n"), "{out}");
    assert!(out.ends_with("quit\nerror: unknown command \"quit\", try \"help\"\n"), "{out}");
}

#[tokio::test]
async fn heartbeat_keeps_ticking_after_bootstrap() {
    let file = write_config(".yaml", CONFIG);
    let system = bootstrap::prepare_from_file(file.path(), &Registry::builtin())
        .unwrap()
        .start()
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(120)).await;

    let session = {
        let mut session = Session::new("", false);
        session.bind_system(system);
        session
    };
    let ticks: u64 = session.execute("routine 2 ticks").unwrap().parse().unwrap();
    assert!(ticks >= 2, "ticks = {ticks}");
}

#[test]
fn toml_and_json_files_are_accepted() {
    let toml = write_config(
        ".toml",
        "[policy]\nname = \"noop\"\n\n[policy.config]\nage = 3\n",
    );
    let prepared = bootstrap::prepare_from_file(toml.path(), &Registry::builtin()).unwrap();
    assert_eq!(prepared.policy_config_json().unwrap(), r#"{"age":3}"#);

    let json = write_config(".json", r#"{"policy": {"name": "noop"}}"#);
    let prepared = bootstrap::prepare_from_file(json.path(), &Registry::builtin()).unwrap();
    assert_eq!(prepared.policy_config_json().unwrap(), "{}");
}

const CANONICAL_PAYLOAD: &str =
    r#"{"IdleDuration":5,"PidWatcher":{"Name":"cgroups"},"big":18446744073709551615}"#;

#[test]
fn policy_payload_round_trips_unchanged() {
    let yaml = write_config(
        ".yaml",
        r#"
policy:
  name: noop
  config:
    PidWatcher:
      Name: cgroups
    IdleDuration: 5
    big: 18446744073709551615
"#,
    );
    let prepared = bootstrap::prepare_from_file(yaml.path(), &Registry::builtin()).unwrap();
    assert_eq!(prepared.policy_config_json().unwrap(), CANONICAL_PAYLOAD);

    let json = write_config(
        ".json",
        &format!(r#"{{"policy": {{"name": "noop", "config": {CANONICAL_PAYLOAD}}}}}"#),
    );
    let prepared = bootstrap::prepare_from_file(json.path(), &Registry::builtin()).unwrap();
    assert_eq!(prepared.policy_config_json().unwrap(), CANONICAL_PAYLOAD);
}

#[test]
fn syntax_errors_name_the_file() {
    let file = write_config(".yaml", "policy: [noop\n");
    let err = bootstrap::prepare_from_file(file.path(), &Registry::builtin()).unwrap_err();
    assert!(matches!(err, MemtierError::ConfigParse { .. }), "{err:?}");
    assert!(
        err.to_string().contains(&file.path().display().to_string()),
        "{err}"
    );
}

#[test]
fn errors_name_the_file_and_the_component() {
    let file = write_config(".yaml", "policy:\n  name: noop\nroutines:\n  - name: mover\n");
    let err = bootstrap::prepare_from_file(file.path(), &Registry::builtin()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains(&file.path().display().to_string()), "{message}");
    assert!(message.contains("unknown routine \"mover\""), "{message}");

    let MemtierError::InConfigFile { error, .. } = err else {
        panic!("expected file attribution, got {err:?}");
    };
    assert!(matches!(
        *error,
        MemtierError::UnknownComponent {
            kind: ComponentKind::Routine,
            ..
        }
    ));
}

#[test]
fn invalid_payload_stops_before_anything_starts() {
    let file = write_config(
        ".yaml",
        "policy:\n  name: noop\nroutines:\n  - name: heartbeat\n    config:\n      interval_ms: 0\n",
    );
    let err = bootstrap::prepare_from_file(file.path(), &Registry::builtin()).unwrap_err();
    assert!(
        err.to_string().contains("routine 1 \"heartbeat\": invalid config"),
        "{err}"
    );
}
