//! Batch scripts: a JSON list of service operations run in order.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use sketchprint_core::{CanvasService, PropertyBag};

/// One scripted call, `{ "op": "add", "args": { ... } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub op: String,
    #[serde(default)]
    pub args: PropertyBag,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Steps(Vec<Step>),
    Wrapped { steps: Vec<Step> },
}

/// Accepts either a bare array of steps or `{ "steps": [...] }`.
pub fn parse(json: &str) -> Result<Vec<Step>> {
    let file: ScriptFile = serde_json::from_str(json).context("script is not a list of steps")?;
    Ok(match file {
        ScriptFile::Steps(steps) | ScriptFile::Wrapped { steps } => steps,
    })
}

/// Result of one step.
#[derive(Debug)]
pub struct Outcome {
    pub op: String,
    pub result: std::result::Result<Value, String>,
}

/// Run `steps` against `service`.
///
/// Stops at the first failing step unless `keep_going` is set, in which case
/// failures are logged and recorded.
pub fn run(service: &mut CanvasService, steps: &[Step], keep_going: bool) -> Result<Vec<Outcome>> {
    let mut outcomes = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        match service.execute(&step.op, &step.args) {
            Ok(value) => outcomes.push(Outcome {
                op: step.op.clone(),
                result: Ok(value),
            }),
            Err(err) if keep_going => {
                log::warn!("Step {} ({}) failed: {}", index, step.op, err);
                outcomes.push(Outcome {
                    op: step.op.clone(),
                    result: Err(err.to_string()),
                });
            }
            Err(err) => bail!("step {} ({}) failed: {}", index, step.op, err),
        }
    }
    Ok(outcomes)
}
