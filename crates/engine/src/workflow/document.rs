//! Workflow document loading.
//!
//! A document is YAML or JSON (JSON parses as YAML) in one of two shapes:
//!
//! - a bundle: `workflows: { <name>: { steps: [...] }, ... }`
//! - a single definition: `steps: [...]`, registered under the name `default`

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use cadence_types::{WorkflowBundle, WorkflowDefinition};
use indexmap::IndexMap;
use serde::Deserialize;

/// Name given to a single-definition document.
pub const DEFAULT_WORKFLOW_NAME: &str = "default";

#[derive(Deserialize)]
struct MultiWorkflowDocument {
    workflows: IndexMap<String, WorkflowDefinition>,
}

/// Parses a workflow document from a file on disk.
pub fn parse_workflow_file(file_path: impl AsRef<Path>) -> Result<WorkflowBundle> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).with_context(|| format!("failed to read workflow file: {}", file_path.display()))?;
    parse_workflow_str(&content).with_context(|| format!("failed to parse workflow file: {}", file_path.display()))
}

/// Parses a workflow document from text.
pub fn parse_workflow_str(content: &str) -> Result<WorkflowBundle> {
    let document: serde_yaml::Value = serde_yaml::from_str(content).context("document is not valid YAML or JSON")?;
    let Some(mapping) = document.as_mapping() else {
        bail!("workflow document must be a mapping with either 'workflows' or 'steps'");
    };

    if mapping.contains_key("workflows") {
        let multi_workflow_document: MultiWorkflowDocument =
            serde_yaml::from_value(document).context("invalid multi-workflow document")?;
        if multi_workflow_document.workflows.is_empty() {
            bail!("multi-workflow document declares no workflows");
        }
        return Ok(WorkflowBundle {
            workflows: multi_workflow_document.workflows,
        });
    }

    if mapping.contains_key("steps") {
        let definition: WorkflowDefinition = serde_yaml::from_value(document).context("invalid workflow definition")?;
        let mut workflows = IndexMap::new();
        workflows.insert(DEFAULT_WORKFLOW_NAME.to_string(), definition);
        return Ok(WorkflowBundle { workflows });
    }

    bail!(
        "unsupported workflow document format. Expected one of:\n\
         - a single workflow definition with a 'steps' list\n\
         - a multi-workflow document with definitions under the 'workflows' key"
    );
}
