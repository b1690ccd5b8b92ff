use std::collections::HashMap;
use std::time::Duration;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use crate::config::defs::{PipelineError, PlatformSettings};
use crate::platform::{Executable, ExecutableDescription, JobHandle, Platform, RemoteFile, RunRequest};

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Deserialize)]
struct FindResult {
    id: String,
    describe: FileDescribe,
}

#[derive(Debug, Deserialize)]
struct FileDescribe {
    name: String,
    #[serde(default)]
    folder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    results: Vec<FindResult>,
    #[serde(default)]
    next: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    url: String,
    #[serde(default)]
    headers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl FindResponse {
    /// Files of one page and the cursor of the next one, if any.
    fn into_page(self) -> (Vec<RemoteFile>, Option<Value>) {
        let files = self
            .results
            .into_iter()
            .map(|r| RemoteFile { id: r.id, name: r.describe.name, folder: r.describe.folder })
            .collect();
        (files, self.next.filter(|next| !next.is_null()))
    }
}

fn find_scope(project: &str, folder: Option<&str>) -> Value {
    let mut scope = json!({ "project": project, "recurse": true });
    if let Some(folder) = folder {
        scope["folder"] = Value::from(folder);
    }
    scope
}

/// `findDataObjects` request for files named like `pattern`, continuing at `starting`.
fn find_body(scope: &Value, pattern: &str, starting: Option<Value>) -> Value {
    let mut body = json!({
        "class": "file",
        "name": { "glob": pattern },
        "scope": scope,
        "describe": { "fields": { "name": true, "folder": true } },
    });
    if let Some(start) = starting {
        body["starting"] = start;
    }
    body
}

/// Error for a failed API call. The platform's `{"error": {type, message}}`
/// body is reported as `type: message`, anything else as is.
fn api_error(route: &str, status: u16, text: &str) -> PipelineError {
    let message = match serde_json::from_str::<ApiErrorBody>(text) {
        Ok(body) => format!("{}: {}", body.error.kind, body.error.message),
        Err(_) => text.to_string(),
    };
    PipelineError::Api { route: route.to_string(), status, message }
}

/// HTTP client for the DNAnexus API.
pub struct DxClient {
    client: Client,
    settings: PlatformSettings,
}

impl DxClient {
    pub fn new(settings: PlatformSettings) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(DxClient { client, settings })
    }

    async fn post<T: DeserializeOwned>(&self, route: &str, body: &Value) -> Result<T, PipelineError> {
        let url = format!(
            "{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        );
        debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.token)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(api_error(route, status.as_u16(), &text));
        }

        Ok(resp.json::<T>().await?)
    }
}

impl Platform for DxClient {
    async fn find_files(&self, folder: Option<&str>, pattern: &str) -> Result<Vec<RemoteFile>, PipelineError> {
        let scope = find_scope(&self.settings.project, folder);

        let mut files = Vec::new();
        let mut starting: Option<Value> = None;
        loop {
            let body = find_body(&scope, pattern, starting.take());
            let page: FindResponse = self.post("/system/findDataObjects", &body).await?;
            let (found, next) = page.into_page();
            for file in &found {
                debug!("Found {} ({})", file.name, file.id);
            }
            files.extend(found);

            match next {
                Some(next) => starting = Some(next),
                None => break,
            }
        }
        Ok(files)
    }

    async fn read_file(&self, file_id: &str) -> Result<String, PipelineError> {
        let body = json!({ "project": self.settings.project });
        let download: DownloadResponse = self.post(&format!("/{}/download", file_id), &body).await?;

        let mut request = self.client.get(&download.url);
        for (key, value) in &download.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::Api {
                route: format!("download of {}", file_id),
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp.text().await?)
    }

    async fn describe(&self, executable: &Executable) -> Result<ExecutableDescription, PipelineError> {
        self.post(&format!("/{}/describe", executable.route()), &json!({})).await
    }

    async fn run(&self, executable: &Executable, request: RunRequest) -> Result<JobHandle, PipelineError> {
        let body = request.to_body(&self.settings.project);
        let resp: RunResponse = self.post(&format!("/{}/run", executable.route()), &body).await?;
        Ok(JobHandle::new(resp.id))
    }
}
