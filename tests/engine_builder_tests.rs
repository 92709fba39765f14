use serde_json::json;
use timestream::{EngineError, Frame, Pipeline};

#[test]
fn test_pipeline_from_json() {
    let config = json!({
        "progress_interval": 10,
        "queue_depth": 4,
        "steps": [
            {"type": "Copy"},
            {"type": "FileStats"},
            {"type": "Pipeline", "config": {"steps": [{"type": "Copy"}]}}
        ]
    });

    let pipeline = Pipeline::from_json(config).unwrap();
    assert_eq!(pipeline.len(), 3);
    assert_eq!(pipeline.step_names(), vec!["CopyStep", "FileStatsStep", "Pipeline"]);
}

#[test]
fn test_null_config_is_an_empty_pipeline() {
    let pipeline = Pipeline::from_json(serde_json::Value::Null).unwrap();
    assert!(pipeline.is_empty());
}

#[test]
fn test_unknown_step_type_is_rejected() {
    let config = json!({"steps": [{"type": "Copy"}, {"type": "Teleport"}]});

    match Pipeline::from_json(config) {
        Err(EngineError::StepContractViolation(message)) => assert!(message.contains("Teleport")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unknown step type accepted"),
    }
}

#[test]
fn test_step_without_type_is_rejected() {
    let config = json!({"steps": [{"config": {}}]});
    assert!(matches!(
        Pipeline::from_json(config),
        Err(EngineError::StepContractViolation(_))
    ));
}

#[test]
fn test_nested_errors_propagate() {
    let config = json!({
        "steps": [{"type": "Pipeline", "config": {"steps": [{"type": "Nope"}]}}]
    });
    assert!(matches!(
        Pipeline::from_json(config),
        Err(EngineError::StepContractViolation(_))
    ));
}

#[test]
fn test_bad_step_config_is_rejected() {
    let missing_output = json!({"steps": [{"type": "WriteFile"}]});
    assert!(matches!(
        Pipeline::from_json(missing_output),
        Err(EngineError::StepContractViolation(_))
    ));

    let steps_not_a_list = json!({"steps": {"type": "Copy"}});
    assert!(matches!(
        Pipeline::from_json(steps_not_a_list),
        Err(EngineError::StepContractViolation(_))
    ));

    assert!(matches!(
        Pipeline::from_json(json!([{"type": "Copy"}])),
        Err(EngineError::StepContractViolation(_))
    ));
}

#[test]
fn test_configured_pipeline_writes_results_and_files() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    let results = dir.path().join("results.tsv");
    let config = json!({
        "steps": [
            {"type": "FileStats"},
            {"type": "WriteFile", "config": {"output": output}},
            {"type": "ResultRecorder", "config": {"output": results, "interval": 0}}
        ]
    });
    let mut pipeline = Pipeline::from_json(config).unwrap();

    let frames = vec![
        Frame::from_path("2017_01_02_03_04_06.jpg", b"abc".to_vec()).unwrap(),
        Frame::from_path("2017_01_02_03_04_05.jpg", b"abcdef".to_vec()).unwrap(),
    ];
    assert_eq!(pipeline.process(frames, 2).unwrap().count(), 2);
    assert!(!results.exists());
    pipeline.finish().unwrap();

    assert_eq!(std::fs::read(output.join("2017_01_02_03_04_05.jpg")).unwrap(), b"abcdef");
    assert_eq!(
        std::fs::read_to_string(&results).unwrap(),
        "Instant\tFileName\tFileSize\n\
         2017_01_02_03_04_05_00\t2017_01_02_03_04_05.jpg\t\"6\"\n\
         2017_01_02_03_04_06_00\t2017_01_02_03_04_06.jpg\t\"3\"\n"
    );
}
