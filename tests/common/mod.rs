#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::Mutex;
use regex::Regex;
use serde_json::{json, Value};
use swgs_cnv_pipelines::config::defs::PipelineError;
use swgs_cnv_pipelines::platform::{
    Executable, ExecutableDescription, JobHandle, Platform, RemoteFile, RunRequest,
};

#[derive(Debug, Clone)]
pub struct Submitted {
    pub route: String,
    pub job: JobHandle,
    pub request: RunRequest,
}

/// In-memory platform: a fixed set of files and executables, recording every run.
#[derive(Default)]
pub struct MockPlatform {
    files: Vec<(RemoteFile, String)>,
    executables: HashMap<String, ExecutableDescription>,
    submitted: Mutex<Vec<Submitted>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, folder: &str, name: &str, content: &str) -> Self {
        let id = format!("file-{}", self.files.len() + 1);
        let file = RemoteFile { id, name: name.to_string(), folder: Some(folder.to_string()) };
        self.files.push((file, content.to_string()));
        self
    }

    pub fn with_executable(mut self, route: &str, description: Value) -> Self {
        let desc: ExecutableDescription = serde_json::from_value(description).unwrap();
        self.executables.insert(route.to_string(), desc);
        self
    }

    pub fn file_id(&self, name: &str) -> String {
        self.files
            .iter()
            .find(|(f, _)| f.name == name)
            .map(|(f, _)| f.id.clone())
            .unwrap_or_else(|| panic!("No file named {}", name))
    }

    pub fn submitted(&self) -> Vec<Submitted> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submitted_named(&self, prefix: &str) -> Vec<Submitted> {
        self.submitted()
            .into_iter()
            .filter(|s| s.request.name.as_deref().unwrap_or("").starts_with(prefix))
            .collect()
    }
}

fn glob_to_regex(pattern: &str) -> Regex {
    let mut re = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).unwrap()
}

fn in_folder(file_folder: &str, folder: &str) -> bool {
    folder == "/" || file_folder == folder || file_folder.starts_with(&format!("{}/", folder))
}

impl Platform for MockPlatform {
    async fn find_files(&self, folder: Option<&str>, pattern: &str) -> Result<Vec<RemoteFile>, PipelineError> {
        let re = glob_to_regex(pattern);
        Ok(self
            .files
            .iter()
            .map(|(f, _)| f)
            .filter(|f| re.is_match(&f.name))
            .filter(|f| match (folder, &f.folder) {
                (Some(folder), Some(file_folder)) => in_folder(file_folder, folder),
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn read_file(&self, file_id: &str) -> Result<String, PipelineError> {
        self.files
            .iter()
            .find(|(f, _)| f.id == file_id)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| PipelineError::Api {
                route: format!("/{}/download", file_id),
                status: 404,
                message: "ResourceNotFound".to_string(),
            })
    }

    async fn describe(&self, executable: &Executable) -> Result<ExecutableDescription, PipelineError> {
        let route = executable.route();
        self.executables.get(&route).cloned().ok_or_else(|| PipelineError::Api {
            route: format!("/{}/describe", route),
            status: 404,
            message: "ResourceNotFound".to_string(),
        })
    }

    async fn run(&self, executable: &Executable, request: RunRequest) -> Result<JobHandle, PipelineError> {
        let mut submitted = self.submitted.lock().unwrap();
        let job = JobHandle::new(format!("job-{}", submitted.len() + 1));
        submitted.push(Submitted { route: executable.route(), job: job.clone(), request });
        Ok(job)
    }
}

pub fn wisecondorx_description() -> Value {
    json!({
        "id": "app-wisecondorx",
        "name": "eggd_wisecondorX",
        "version": "1.2.0",
        "inputSpec": [
            {"name": "bam", "class": "array:file", "optional": true},
            {"name": "bai", "class": "array:file", "optional": true},
            {"name": "binsize_convert", "class": "int", "optional": true},
            {"name": "convert_npz", "class": "boolean", "optional": true},
            {"name": "npz", "class": "array:file", "optional": true},
            {"name": "binsize_newref", "class": "int", "optional": true},
            {"name": "create_ref", "class": "boolean", "optional": true},
            {"name": "reference", "class": "file", "optional": true},
            {"name": "variant_calling", "class": "boolean", "optional": true},
            {"name": "sex", "class": "string", "optional": true},
        ]
    })
}

pub fn downsample_description() -> Value {
    json!({
        "id": "app-downsample",
        "name": "picard_downsample",
        "version": "1.1.0",
        "inputSpec": [
            {"name": "sorted_bam", "class": "file"},
            {"name": "fraction", "class": "float"},
        ]
    })
}

pub fn link(id: &str) -> Value {
    json!({"$dnanexus_link": id})
}

pub fn job_link(job: &str, field: &str) -> Value {
    json!({"$dnanexus_link": {"job": job, "field": field}})
}
