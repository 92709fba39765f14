use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Pipeline;
use crate::core::Step;
use crate::error::{EngineError, Result};
use crate::io::DirectorySink;
use crate::steps::{
    CopyStep, FileStatsStep, ResultRecorderConfig, ResultRecorderStep, WriteFileConfig, WriteFileStep,
};

fn violation(message: impl Into<String>) -> EngineError {
    EngineError::StepContractViolation(message.into())
}

fn step_config<T: DeserializeOwned>(step_type: &str, config: Value) -> Result<T> {
    serde_json::from_value(config)
        .map_err(|err| violation(format!("invalid config for {step_type} step: {err}")))
}

fn build_step(config: &Value) -> Result<Box<dyn Step>> {
    let step_type = config
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| violation(format!("step is missing a 'type': {config}")))?;
    let step_cfg = config.get("config").cloned().unwrap_or(Value::Null);

    let step: Box<dyn Step> = match step_type {
        "Copy" => Box::new(CopyStep),
        "FileStats" => Box::new(FileStatsStep),
        "WriteFile" => {
            let cfg: WriteFileConfig = step_config(step_type, step_cfg)?;
            Box::new(WriteFileStep::new(DirectorySink::new(cfg.output)))
        }
        "ResultRecorder" => {
            let cfg: ResultRecorderConfig = step_config(step_type, step_cfg)?;
            Box::new(ResultRecorderStep::from_config(cfg))
        }
        "Pipeline" => Box::new(Pipeline::from_json(step_cfg)?),
        other => return Err(violation(format!("unknown step type '{other}'"))),
    };
    Ok(step)
}

impl Pipeline {
    /// Build a pipeline from a JSON description.
    ///
    /// ```json
    /// {
    ///   "progress_interval": 500,
    ///   "steps": [
    ///     {"type": "FileStats"},
    ///     {"type": "Pipeline", "config": {"steps": [{"type": "Copy"}]}}
    ///   ]
    /// }
    /// ```
    ///
    /// Every step is validated before the pipeline is returned.
    pub fn from_json(config: Value) -> Result<Self> {
        if !(config.is_object() || config.is_null()) {
            return Err(violation(format!("pipeline config must be an object, got {config}")));
        }

        let mut pipeline = Pipeline::new();
        if let Some(interval) = config.get("progress_interval").and_then(Value::as_u64) {
            pipeline.set_progress_interval(interval);
        }
        if let Some(depth) = config.get("queue_depth").and_then(Value::as_u64) {
            pipeline.set_queue_depth(depth as usize);
        }

        match config.get("steps") {
            None | Some(Value::Null) => {}
            Some(Value::Array(steps)) => {
                for step_config in steps {
                    pipeline.add_boxed_step(build_step(step_config)?);
                }
            }
            Some(other) => return Err(violation(format!("'steps' must be an array, got {other}"))),
        }

        Ok(pipeline)
    }
}
