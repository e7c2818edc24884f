//! Pipeline definition models served by the Remote Executor.
//!
//! A pipeline (called a "workflow" by the executor's HTTP API) is an ordered
//! list of steps. The executor owns the definitions; the client only reads
//! them when a tracker session is opened.

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// The executor's step vocabulary.
///
/// Steps arrive as plain strings in the `step` field of each pipeline entry.
/// Known names map onto their own variant; anything else is kept verbatim in
/// [`StepKind::Unknown`] so that newer executors remain usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
    InitRun,
    LoadConfig,
    DiscoverInputs,
    /// Pauses the tracker until the user supplies the files listed in the
    /// step's `file_specs` parameter.
    RequestUserFiles,
    RunExcelEtl,
    EnrichWithContext,
    ExportConsolidatedExcel,
    GenerateGraphics,
    GenerateTables,
    RenderReport,
    GenerateDocxReport,
    DeleteTempFiles,
    Unknown(String),
}

impl StepKind {
    /// The wire name of this step.
    pub fn as_str(&self) -> &str {
        match self {
            StepKind::InitRun => "InitRun",
            StepKind::LoadConfig => "LoadConfig",
            StepKind::DiscoverInputs => "DiscoverInputs",
            StepKind::RequestUserFiles => "RequestUserFiles",
            StepKind::RunExcelEtl => "RunExcelETL",
            StepKind::EnrichWithContext => "EnrichWithContext",
            StepKind::ExportConsolidatedExcel => "ExportConsolidatedExcel",
            StepKind::GenerateGraphics => "GenerateGraphics",
            StepKind::GenerateTables => "GenerateTables",
            StepKind::RenderReport => "RenderReport",
            StepKind::GenerateDocxReport => "GenerateDocxReport",
            StepKind::DeleteTempFiles => "DeleteTempFiles",
            StepKind::Unknown(name) => name,
        }
    }

    /// A short human-readable label for display.
    pub fn label(&self) -> &str {
        match self {
            StepKind::InitRun => "Initialize run",
            StepKind::LoadConfig => "Load configuration",
            StepKind::DiscoverInputs => "Discover input files",
            StepKind::RequestUserFiles => "Upload files",
            StepKind::RunExcelEtl => "Process data",
            StepKind::EnrichWithContext => "Enrich with context",
            StepKind::ExportConsolidatedExcel => "Export consolidated data",
            StepKind::GenerateGraphics => "Generate charts",
            StepKind::GenerateTables => "Generate tables",
            StepKind::RenderReport => "Render report",
            StepKind::GenerateDocxReport => "Generate document",
            StepKind::DeleteTempFiles => "Clean up temporary files",
            StepKind::Unknown(name) => name,
        }
    }

    pub fn is_file_request(&self) -> bool {
        matches!(self, StepKind::RequestUserFiles)
    }
}

impl From<String> for StepKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "InitRun" => StepKind::InitRun,
            "LoadConfig" => StepKind::LoadConfig,
            "DiscoverInputs" => StepKind::DiscoverInputs,
            "RequestUserFiles" => StepKind::RequestUserFiles,
            "RunExcelETL" => StepKind::RunExcelEtl,
            "EnrichWithContext" => StepKind::EnrichWithContext,
            "ExportConsolidatedExcel" => StepKind::ExportConsolidatedExcel,
            "GenerateGraphics" => StepKind::GenerateGraphics,
            "GenerateTables" => StepKind::GenerateTables,
            "RenderReport" => StepKind::RenderReport,
            "GenerateDocxReport" => StepKind::GenerateDocxReport,
            "DeleteTempFiles" => StepKind::DeleteTempFiles,
            _ => StepKind::Unknown(name),
        }
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upload slot requested by a `RequestUserFiles` step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct FileSpec {
    /// Key the executor expects as `input_key` when the files are uploaded.
    pub id: String,

    /// Label shown to the user and used in validation messages.
    pub label: String,

    /// Whether more than one file may be supplied for this slot.
    #[serde(default)]
    pub multiple: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Slots are required unless the executor says otherwise.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

#[derive(Deserialize)]
struct FileRequestParams {
    #[serde(default)]
    file_specs: Vec<FileSpec>,
}

/// A single step of a pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct Step {
    /// Which operation the executor runs for this step.
    #[serde(rename = "step")]
    #[ts(type = "string")]
    pub name: StepKind,

    /// Executor-specific parameters. Opaque to the client except for
    /// `file_specs` on file-request steps.
    #[serde(default)]
    pub params: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: StepKind::from(name.into()),
            params: serde_json::Value::Null,
            description: None,
        }
    }

    /// Attach executor parameters.
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// The upload slots declared by this step.
    ///
    /// Returns an empty list for every step that is not a file request, and
    /// for file requests without parameters.
    ///
    /// # Errors
    ///
    /// Fails when the step is a file request whose `file_specs` parameter
    /// does not have the expected shape.
    pub fn file_specs(&self) -> Result<Vec<FileSpec>, serde_json::Error> {
        if !self.name.is_file_request() || self.params.is_null() {
            return Ok(Vec::new());
        }
        let params: FileRequestParams = serde_json::from_value(self.params.clone())?;
        Ok(params.file_specs)
    }
}

/// Descriptive metadata attached to a pipeline definition.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct WorkflowMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The full definition of a pipeline as fetched for one tracker session.
///
/// Step order is execution order. The definition is never mutated locally.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PipelineDefinition {
    /// Opaque identifier assigned by the executor.
    pub id: String,

    pub steps: Vec<Step>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<WorkflowMetadata>,
}

impl PipelineDefinition {
    pub fn new(id: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: id.into(),
            steps,
            metadata: None,
        }
    }

    /// True when the pipeline opens with a file-request step.
    pub fn starts_with_file_request(&self) -> bool {
        self.steps
            .first()
            .is_some_and(|step| step.name.is_file_request())
    }

    /// Upload slots of the leading file-request step, if any.
    ///
    /// # Errors
    ///
    /// Propagates a malformed `file_specs` parameter.
    pub fn file_specs(&self) -> Result<Vec<FileSpec>, serde_json::Error> {
        match self.steps.first() {
            Some(step) => step.file_specs(),
            None => Ok(Vec::new()),
        }
    }

    /// Display name, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .unwrap_or(&self.id)
    }
}

/// One row of the executor's workflow listing (`GET /workflows`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct WorkflowSummary {
    /// The executor calls this `id_evaluation` and may send it as a number.
    #[serde(rename = "id_evaluation", alias = "id", deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(rename = "pipeline", default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Input format tag, e.g. `EXCEL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Output format tag, e.g. `PDF`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<String>,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number identifier, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_kind_round_trips_known_and_unknown_names() {
        assert_eq!(StepKind::from("RunExcelETL".to_string()), StepKind::RunExcelEtl);
        assert_eq!(StepKind::RunExcelEtl.as_str(), "RunExcelETL");

        let custom = StepKind::from("TranslateReport".to_string());
        assert_eq!(custom, StepKind::Unknown("TranslateReport".to_string()));
        assert_eq!(String::from(custom), "TranslateReport");
    }

    #[test]
    fn test_file_specs_only_for_file_request_steps() {
        let step = Step::new("RenderReport").with_params(json!({
            "file_specs": [{"id": "a", "label": "A"}]
        }));
        assert!(step.file_specs().unwrap().is_empty());

        let step = Step::new("RequestUserFiles").with_params(json!({
            "file_specs": [
                {"id": "a", "label": "A", "multiple": true},
                {"id": "b", "label": "B", "required": false}
            ]
        }));
        let specs = step.file_specs().unwrap();
        assert_eq!(specs.len(), 2);
        assert!(specs[0].multiple);
        assert!(specs[0].required);
        assert!(!specs[1].required);
    }

    #[test]
    fn test_malformed_file_specs_is_an_error() {
        let step = Step::new("RequestUserFiles").with_params(json!({"file_specs": "nope"}));
        assert!(step.file_specs().is_err());
    }

    #[test]
    fn test_starts_with_file_request() {
        let plain = PipelineDefinition::new("1", vec![Step::new("InitRun")]);
        assert!(!plain.starts_with_file_request());

        let gated = PipelineDefinition::new(
            "2",
            vec![Step::new("RequestUserFiles"), Step::new("RunExcelETL")],
        );
        assert!(gated.starts_with_file_request());

        let empty = PipelineDefinition::new("3", vec![]);
        assert!(!empty.starts_with_file_request());
        assert!(empty.file_specs().unwrap().is_empty());
    }

    #[test]
    fn test_workflow_summary_accepts_numeric_id() {
        let summary: WorkflowSummary = serde_json::from_value(json!({
            "id_evaluation": 2,
            "pipeline": "SIMCE 2024",
            "input": "EXCEL",
            "output": "PDF",
            "last_run": "2024-11-02"
        }))
        .unwrap();
        assert_eq!(summary.id, "2");
        assert_eq!(summary.name, "SIMCE 2024");
        assert_eq!(summary.description, None);
    }
}
