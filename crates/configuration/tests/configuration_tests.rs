//! Tests that a configuration survives a trip to disk and back.

use similar_asserts::assert_eq;

use warehouse_sql_configuration::{
    make_runtime_configuration, parse_configuration, version1, write_parsed_configuration,
    ParseConfigurationError, ParsedConfiguration,
};

#[tokio::test]
async fn initial_configuration_round_trips() {
    let dir = tempfile::tempdir().expect("tempfile::tempdir");

    write_parsed_configuration(ParsedConfiguration::initial(), dir.path())
        .await
        .expect("write_parsed_configuration");
    let parsed = parse_configuration(dir.path())
        .await
        .expect("parse_configuration");

    assert_eq!(parsed, ParsedConfiguration::initial());
    let configuration = make_runtime_configuration(parsed).expect("make_runtime_configuration");
    assert_eq!(
        configuration.metadata.tables.0["FooTable"].table_name,
        "footable"
    );
}

#[tokio::test]
async fn written_configuration_matches_its_schema() {
    let dir = tempfile::tempdir().expect("tempfile::tempdir");
    write_parsed_configuration(ParsedConfiguration::initial(), dir.path())
        .await
        .expect("write_parsed_configuration");

    let read_json = |file_name: &str| -> serde_json::Value {
        let contents = std::fs::read_to_string(dir.path().join(file_name)).expect("read file");
        serde_json::from_str(&contents).expect("serde_json::from_str")
    };
    let schema = read_json(version1::CONFIGURATION_JSONSCHEMA_FILENAME);
    let configuration = read_json(version1::CONFIGURATION_FILENAME);

    let compiled = jsonschema::JSONSchema::compile(&schema).expect("schema compiles");
    assert!(compiled.is_valid(&configuration));
    assert_eq!(configuration["version"], serde_json::json!(1));
}

#[tokio::test]
async fn parse_errors_carry_their_position() {
    let dir = tempfile::tempdir().expect("tempfile::tempdir");
    std::fs::write(
        dir.path().join(version1::CONFIGURATION_FILENAME),
        "{\n  \"version\": 1,\n  \"metadata\": [\n}\n",
    )
    .expect("write configuration");

    match parse_configuration(dir.path()).await {
        Err(ParseConfigurationError::ParseError { line, .. }) => assert_eq!(line, 4),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_configuration_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempfile::tempdir");
    assert!(matches!(
        parse_configuration(dir.path().join("missing")).await,
        Err(ParseConfigurationError::IoErrorButStringified(_))
    ));
}
