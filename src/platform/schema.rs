use std::collections::BTreeMap;
use serde_json::{Map, Value};
use crate::config::defs::PipelineError;
use crate::platform::{DataLink, ExecutableDescription, InputParam};

const FILE_CLASS: &str = "file";
const FILE_ARRAY_CLASS: &str = "array:file";

/// Declared inputs of an app or workflow, keyed by parameter name.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSchema {
    executable: String,
    params: BTreeMap<String, InputParam>,
}

impl InputSchema {
    pub fn from_description(desc: &ExecutableDescription) -> Self {
        let params = desc
            .input_spec
            .iter()
            .flatten()
            .map(|p| (p.name.clone(), p.clone()))
            .collect();
        InputSchema { executable: desc.name.clone(), params }
    }

    /// Workflow inputs are addressed as `<stage-id>.<input>`, so each stage's
    /// executable spec is merged in under its stage prefix.
    ///
    /// # Arguments
    ///
    /// * `workflow` - Description of the workflow itself.
    /// * `stages` - (stage id, description of the stage executable) pairs.
    pub fn for_workflow(workflow: &ExecutableDescription, stages: &[(String, ExecutableDescription)]) -> Self {
        let mut schema = InputSchema::from_description(workflow);
        for (stage_id, stage_desc) in stages {
            for param in stage_desc.input_spec.iter().flatten() {
                let name = format!("{}.{}", stage_id, param.name);
                schema.params.insert(name.clone(), InputParam { name, ..param.clone() });
            }
        }
        schema
    }

    pub fn class_of(&self, input: &str) -> Result<&str, PipelineError> {
        self.params
            .get(input)
            .map(|p| p.class.as_str())
            .ok_or_else(|| PipelineError::UnknownInput {
                executable: self.executable.clone(),
                input: input.to_string(),
            })
    }

    /// Shapes links to the declared class of `input`: a list for
    /// `array:file`, a single link for `file`.
    pub fn adapt_links(&self, input: &str, links: Vec<DataLink>) -> Result<Value, PipelineError> {
        let class = self.class_of(input)?;
        let cardinality_error = |links: &[DataLink]| PipelineError::Cardinality {
            input: input.to_string(),
            class: class.to_string(),
            count: links.len(),
            ids: links.iter().map(|l| l.id().to_string()).collect(),
        };

        match class {
            FILE_ARRAY_CLASS => {
                if links.is_empty() {
                    return Err(cardinality_error(&links));
                }
                Ok(Value::Array(links.iter().map(DataLink::to_value).collect()))
            }
            FILE_CLASS => match links.as_slice() {
                [link] => Ok(link.to_value()),
                _ => Err(cardinality_error(&links)),
            },
            other => Err(PipelineError::UnsupportedInputClass {
                input: input.to_string(),
                class: other.to_string(),
            }),
        }
    }

    pub fn inputs(&self) -> JobInputs<'_> {
        JobInputs { schema: self, values: Map::new() }
    }
}

/// Input payload for one job, checked against an `InputSchema`.
#[derive(Debug)]
pub struct JobInputs<'a> {
    schema: &'a InputSchema,
    values: Map<String, Value>,
}

impl<'a> JobInputs<'a> {
    pub fn links(mut self, input: &str, links: Vec<DataLink>) -> Result<Self, PipelineError> {
        let value = self.schema.adapt_links(input, links)?;
        self.values.insert(input.to_string(), value);
        Ok(self)
    }

    pub fn value(mut self, input: &str, value: impl Into<Value>) -> Result<Self, PipelineError> {
        self.schema.class_of(input)?;
        self.values.insert(input.to_string(), value.into());
        Ok(self)
    }

    pub fn build(self) -> Map<String, Value> {
        self.values
    }
}
