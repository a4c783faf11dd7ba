use std::fs;

use routebook::{
    CompileError, Context, DataSources, Engine, MessageCatalog, RoutebookError, RuleConfig,
    RuleSet, Warning,
};

const RULES: &str = r#"{
    "rules": [
        {"id": "R1", "priority": 1, "conditions": {"field": "State", "val": "VA"}, "message_ref": "VA"},
        {"id": "R2", "priority": 2, "conditions": {"field": "State", "op": "gte", "val": 1}, "message_ref": "MISSING"}
    ]
}"#;

#[test]
fn rule_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(&path, RULES).unwrap();

    let config = RuleConfig::from_file(&path).unwrap();
    fs::write(&path, config.to_json().unwrap()).unwrap();
    let ruleset = RuleSet::from_file(&path).unwrap();

    assert_eq!(ruleset.evaluation_order(), ["R1", "R2"]);
    assert_eq!(
        ruleset.warnings(),
        [Warning::UnknownOperator {
            owner: "R2".into(),
            op: "gte".into()
        }]
    );
}

#[test]
fn missing_rule_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RuleSet::from_file(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, RoutebookError::Io(_)));
}

#[test]
fn rule_missing_required_field_is_config_error() {
    let err = RuleSet::from_json(r#"{"rules": [{"id": "R1", "conditions": {}}]}"#).unwrap_err();
    assert!(matches!(err, RoutebookError::Config(_)), "{err}");
}

#[test]
fn duplicate_ids_are_compile_errors() {
    let err = RuleSet::from_json(
        r#"{"rules": [
            {"id": "R1", "conditions": {}, "message_ref": "A"},
            {"id": "R1", "conditions": {}, "message_ref": "B"}
        ]}"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RoutebookError::Compile(CompileError::DuplicateRule { ref id }) if id == "R1"
    ));
}

#[test]
fn cyclic_templates_are_compile_errors() {
    let err = RuleSet::from_json(
        r#"{
            "rules": [],
            "condition_templates": {
                "a": {"use_template": "b"},
                "b": {"not": {"use_template": "a"}}
            }
        }"#,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "cyclic condition template reference: a -> b -> a"
    );
}

#[test]
fn message_dir_loads_markdown_only() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("VA.md"), "---\ntitle: Virginia\n---\nHello {{State}}").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    fs::create_dir(dir.path().join("drafts.md")).unwrap();

    let catalog = MessageCatalog::from_dir(dir.path()).unwrap();
    assert_eq!(catalog.names().collect::<Vec<_>>(), ["VA"]);
    assert_eq!(catalog.get("VA"), Some("Hello {{State}}"));
}

#[test]
fn missing_message_dir_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = MessageCatalog::from_dir(dir.path().join("absent")).unwrap();
    assert!(catalog.is_empty());
}

#[test]
fn engine_from_paths_reports_missing_messages() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    let messages = dir.path().join("messages");
    fs::write(&rules, RULES).unwrap();
    fs::create_dir(&messages).unwrap();
    fs::write(messages.join("VA.md"), "Hello {{State}}").unwrap();

    let engine = Engine::from_paths(&rules, &messages).unwrap();
    assert!(engine.warnings().contains(&Warning::MissingMessage {
        owner: "R2".into(),
        message_ref: "MISSING".into(),
    }));
    let message = engine
        .resolve("VA", &Context::new().set("State", "VA"), &DataSources::new())
        .unwrap();
    assert_eq!(message.markdown, "Hello VA");
}

#[test]
fn reload_from_paths_picks_up_edits_and_survives_bad_ones() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    let messages = dir.path().join("messages");
    fs::write(&rules, RULES).unwrap();
    fs::create_dir(&messages).unwrap();
    fs::write(messages.join("VA.md"), "old text").unwrap();

    let engine = Engine::from_paths(&rules, &messages).unwrap();
    let ctx = Context::new().set("State", "VA");
    let ds = DataSources::new();

    fs::write(messages.join("VA.md"), "new text").unwrap();
    engine.reload_from_paths(&rules, &messages).unwrap();
    assert_eq!(engine.resolve("VA", &ctx, &ds).unwrap().markdown, "new text");

    fs::write(&rules, "{ not json").unwrap();
    fs::write(messages.join("VA.md"), "newer text").unwrap();
    let err = engine.reload_from_paths(&rules, &messages).unwrap_err();
    assert!(matches!(err, RoutebookError::Config(_)));
    assert_eq!(engine.resolve("VA", &ctx, &ds).unwrap().markdown, "new text");
    assert_eq!(engine.evaluate(&ctx, &ds).map(|m| m.rule_id), Some("R1".to_owned()));
}

#[test]
fn reload_from_missing_message_dir_keeps_templates() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.json");
    let messages = dir.path().join("messages");
    fs::write(&rules, RULES).unwrap();
    fs::create_dir(&messages).unwrap();
    fs::write(messages.join("VA.md"), "Hello {{State}}").unwrap();

    let engine = Engine::from_paths(&rules, &messages).unwrap();
    let err = engine
        .reload_from_paths(&rules, dir.path().join("mesages"))
        .unwrap_err();

    assert!(
        matches!(err, RoutebookError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound),
        "{err}"
    );
    assert_eq!(engine.list_template_names(), ["VA"]);
    assert!(matches!(
        engine.answer(&Context::new().set("State", "VA"), &DataSources::new()),
        routebook::Outcome::Answered { .. }
    ));
}
