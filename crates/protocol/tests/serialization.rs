use pretty_assertions::assert_eq;
use rf_protocol::*;
use serde_json::json;

#[test]
fn test_pipeline_definition_from_config_reply() {
    // Shape served by GET /workflows/{id}/config
    let body = json!({
        "pipeline": [
            {
                "step": "RequestUserFiles",
                "params": {
                    "file_specs": [
                        {"id": "notas", "label": "Notas", "multiple": true},
                        {"id": "contexto", "label": "Contexto", "required": false}
                    ]
                },
                "description": "Subir archivos"
            },
            {"step": "RunExcelETL", "params": {}},
            {"step": "RenderReport", "params": {"template": "informe.html"}},
            {"step": "SomethingNew"}
        ],
        "workflow_metadata": {"name": "Informe 4B", "description": "Resultados del curso"}
    });

    let reply: ConfigReply = serde_json::from_value(body).expect("Failed to deserialize ConfigReply");
    let definition = reply
        .into_definition("7")
        .expect("Reply without error should produce a definition");

    assert_eq!(definition.id, "7");
    assert_eq!(definition.steps.len(), 4);
    assert!(definition.starts_with_file_request());
    assert_eq!(definition.steps[1].name, StepKind::RunExcelEtl);
    assert_eq!(
        definition.steps[3].name,
        StepKind::Unknown("SomethingNew".to_string())
    );
    assert_eq!(definition.display_name(), "Informe 4B");

    let specs = definition.file_specs().expect("file_specs should parse");
    assert_eq!(specs.len(), 2);
    assert!(specs[0].multiple);
    assert!(specs[0].required);
    assert!(!specs[1].multiple);
    assert!(!specs[1].required);
}

#[test]
fn test_step_name_serializes_with_wire_spelling() {
    let step = Step::new(StepKind::RunExcelEtl);
    let json = serde_json::to_value(&step).expect("Failed to serialize Step");

    assert_eq!(json["step"], "RunExcelETL");
}

#[test]
fn test_session_status_serialization() {
    let status = SessionStatus::RequestingFiles;
    let json = serde_json::to_value(status).expect("Failed to serialize SessionStatus");

    assert_eq!(json, "requesting_files");

    let deserialized: SessionStatus =
        serde_json::from_value(json).expect("Failed to deserialize SessionStatus");
    assert_eq!(deserialized, SessionStatus::RequestingFiles);
}

#[test]
fn test_tracker_error_is_tagged_by_kind() {
    let error = TrackerError::Upload {
        spec_id: "notas".to_string(),
        message: "413 Payload Too Large".to_string(),
    };

    let json = serde_json::to_value(&error).expect("Failed to serialize TrackerError");
    assert_eq!(json["kind"], "upload");
    assert_eq!(json["spec_id"], "notas");

    let deserialized: TrackerError =
        serde_json::from_value(json).expect("Failed to deserialize TrackerError");
    assert_eq!(deserialized, error);
}

#[test]
fn test_global_config_defaults_from_empty_toml_equivalent() {
    let config: GlobalConfig = serde_json::from_value(json!({})).expect("Empty config is valid");

    assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(config.tracker.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_global_config_uses_kebab_case_keys() {
    let config: GlobalConfig = serde_json::from_value(json!({
        "api": {"base-url": "http://reports.internal/api"},
        "tracker": {"tick-interval-ms": 100}
    }))
    .expect("Failed to deserialize GlobalConfig");

    assert_eq!(config.api.base_url, "http://reports.internal/api");
    assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(config.tracker.tick_interval_ms, 100);
}

#[test]
fn test_op_enum_serialization() {
    use std::path::PathBuf;

    let op = Op::RecordFiles {
        spec_id: "notas".to_string(),
        files: vec![PathBuf::from("notas_4B.xlsx")],
    };

    let json = serde_json::to_value(&op).expect("Failed to serialize Op");
    assert_eq!(json["type"], "recordFiles");
    assert!(json["payload"].is_object());

    let deserialized: Op = serde_json::from_value(json).expect("Failed to deserialize Op");
    match deserialized {
        Op::RecordFiles { spec_id, files } => {
            assert_eq!(spec_id, "notas");
            assert_eq!(files.len(), 1);
        }
        _ => panic!("Wrong variant"),
    }

    let run_op = Op::RunAll;
    let json = serde_json::to_value(&run_op).expect("Failed to serialize Op::RunAll");
    assert_eq!(json["type"], "runAll");
}

#[test]
fn test_event_enum_serialization() {
    use uuid::Uuid;

    let session_id = Uuid::new_v4();
    let event = Event::ExecutionFailed {
        session_id,
        error: TrackerError::Execution {
            message: "boom".to_string(),
        },
    };

    let json = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(json["type"], "executionFailed");
    assert_eq!(json["payload"]["error"]["kind"], "execution");
    assert_eq!(json["payload"]["error"]["message"], "boom");
    assert_eq!(event.session_id(), Some(session_id));

    let listed = Event::WorkflowsListed { workflows: vec![] };
    let json = serde_json::to_value(&listed).expect("Failed to serialize Event");
    assert_eq!(json["type"], "workflowsListed");
    assert_eq!(listed.session_id(), None);
}

#[test]
fn test_workflow_summary_accepts_numeric_ids() {
    let rows: Vec<WorkflowSummary> = serde_json::from_value(json!([
        {
            "id_evaluation": 3,
            "pipeline": "Informe 4B",
            "description": "Resultados del curso",
            "input": "notas.xlsx",
            "output": "informe.docx",
            "last_run": "2024-05-01"
        },
        {"id_evaluation": "9", "pipeline": "Informe 5A"}
    ]))
    .expect("Failed to deserialize workflow rows");

    assert_eq!(rows[0].id, "3");
    assert_eq!(rows[0].name, "Informe 4B");
    assert_eq!(rows[1].id, "9");
}
