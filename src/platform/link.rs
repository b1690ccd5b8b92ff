use serde_json::Value;
use crate::config::defs::DX_LINK_KEY;

/// Reference to a platform object as it appears in job inputs.
///
/// `JobOutput` is a pending reference to a field of an upstream job. It is
/// only ever resolved by the platform when the downstream job starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLink {
    File(String),
    JobOutput { job: String, field: String },
}

impl DataLink {
    pub fn file(id: impl Into<String>) -> Self {
        DataLink::File(id.into())
    }

    /// Id of the linked file, or of the upstream job for pending links.
    pub fn id(&self) -> &str {
        match self {
            DataLink::File(id) => id,
            DataLink::JobOutput { job, .. } => job,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DataLink::File(id) => serde_json::json!({ DX_LINK_KEY: id }),
            DataLink::JobOutput { job, field } => {
                serde_json::json!({ DX_LINK_KEY: { "job": job, "field": field } })
            }
        }
    }
}

/// A submitted job or analysis. Only used for dependencies and output references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
}

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        JobHandle { id: id.into() }
    }

    pub fn output_ref(&self, field: &str) -> DataLink {
        DataLink::JobOutput {
            job: self.id.clone(),
            field: field.to_string(),
        }
    }
}
