/// Boundary to the remote object store and job executor
pub mod client;
pub mod link;
pub mod schema;

use std::collections::BTreeMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use crate::config::defs::PipelineError;

pub use client::DxClient;
pub use link::{DataLink, JobHandle};
pub use schema::{InputSchema, JobInputs};


#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folder: Option<String>,
}

/// Something the platform can describe and run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Executable {
    /// Published app addressed by name
    App(String),
    /// Any executable addressed by id (workflow-, app-, applet-)
    Id(String),
}

impl Executable {
    pub fn route(&self) -> String {
        match self {
            Executable::App(name) => format!("app-{}", name),
            Executable::Id(id) => id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputParam {
    pub name: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowStage {
    pub id: String,
    pub executable: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableDescription {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub input_spec: Option<Vec<InputParam>>,
    #[serde(default)]
    pub stages: Vec<WorkflowStage>,
}

/// Everything submitted alongside the inputs of a job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunRequest {
    pub input: Map<String, Value>,
    pub folder: Option<String>,
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub depends_on: Vec<JobHandle>,
    pub instance_type: Option<String>,
    pub stage_folders: BTreeMap<String, String>,
}

impl RunRequest {
    pub fn new(input: Map<String, Value>) -> Self {
        RunRequest { input, ..Default::default() }
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn depends_on(mut self, jobs: Vec<JobHandle>) -> Self {
        self.depends_on = jobs;
        self
    }

    pub fn instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = Some(instance_type.into());
        self
    }

    pub fn stage_folders(mut self, stage_folders: BTreeMap<String, String>) -> Self {
        self.stage_folders = stage_folders;
        self
    }

    /// Request body for the `/run` route.
    pub fn to_body(&self, project: &str) -> Value {
        let mut body = Map::new();
        body.insert("project".to_string(), Value::from(project));
        body.insert("input".to_string(), Value::Object(self.input.clone()));
        if let Some(folder) = &self.folder {
            body.insert("folder".to_string(), Value::from(folder.as_str()));
        }
        if let Some(name) = &self.name {
            body.insert("name".to_string(), Value::from(name.as_str()));
        }
        if !self.tags.is_empty() {
            body.insert("tags".to_string(), Value::from(self.tags.clone()));
        }
        if !self.depends_on.is_empty() {
            let ids: Vec<Value> = self.depends_on.iter().map(|j| Value::from(j.id.as_str())).collect();
            body.insert("dependsOn".to_string(), Value::Array(ids));
        }
        if let Some(instance_type) = &self.instance_type {
            body.insert(
                "systemRequirements".to_string(),
                serde_json::json!({ "*": { "instanceType": instance_type } }),
            );
        }
        if !self.stage_folders.is_empty() {
            let folders: Map<String, Value> = self
                .stage_folders
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            body.insert("stageFolders".to_string(), Value::Object(folders));
        }
        Value::Object(body)
    }
}


/// Operations this crate needs from the platform. Calls are made one at a
/// time; nothing here waits on job completion.
#[allow(async_fn_in_trait)]
pub trait Platform {
    /// Files whose name matches `pattern` (glob), recursively below `folder`
    /// or anywhere in the project when `folder` is None.
    async fn find_files(&self, folder: Option<&str>, pattern: &str) -> Result<Vec<RemoteFile>, PipelineError>;

    /// Full text content of a file.
    async fn read_file(&self, file_id: &str) -> Result<String, PipelineError>;

    async fn describe(&self, executable: &Executable) -> Result<ExecutableDescription, PipelineError>;

    async fn run(&self, executable: &Executable, request: RunRequest) -> Result<JobHandle, PipelineError>;

    /// Exactly one file matching `pattern`, error on none or several.
    async fn find_one_file(&self, folder: Option<&str>, pattern: &str) -> Result<RemoteFile, PipelineError> {
        let mut files = self.find_files(folder, pattern).await?;
        match files.len() {
            0 => Err(PipelineError::NoFilesFound {
                pattern: pattern.to_string(),
                folders: folder.unwrap_or("/").to_string(),
            }),
            1 => Ok(files.remove(0)),
            count => Err(PipelineError::AmbiguousObject { pattern: pattern.to_string(), count }),
        }
    }
}

/// Platform folders are absolute.
pub fn remote_folder(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
