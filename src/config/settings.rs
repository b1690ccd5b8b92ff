/// Resolution of platform connection settings from arguments and the DX_* environment
use serde::Deserialize;
use crate::cli::Arguments;
use crate::config::defs::{PipelineError, PlatformSettings, DEFAULT_API_URL, SWGS_PROJECT};

#[derive(Debug, Deserialize)]
struct SecurityContext {
    #[serde(default)]
    auth_token_type: Option<String>,
    auth_token: String,
}

/// Builds the platform settings, preferring explicit arguments over the environment.
///
/// # Arguments
///
/// * `args` - Parsed command-line arguments.
/// * `env` - Variable lookup, normally `std::env::var(..).ok()`.
///
/// # Returns
/// PlatformSettings or InvalidConfig if no token can be found.
pub fn resolve_platform_settings<F>(args: &Arguments, env: F) -> Result<PlatformSettings, PipelineError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_url = match &args.api_url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => api_url_from_env(&env),
    };

    let token = match &args.token {
        Some(token) if !token.is_empty() => token.clone(),
        _ => token_from_security_context(&env)?
            .ok_or_else(|| PipelineError::InvalidConfig(
                "No API token given. Use --token, DX_AUTH_TOKEN or DX_SECURITY_CONTEXT".to_string(),
            ))?,
    };

    let project = args
        .project
        .clone()
        .or_else(|| env("DX_PROJECT_CONTEXT_ID"))
        .unwrap_or_else(|| SWGS_PROJECT.to_string());

    Ok(PlatformSettings { api_url, token, project })
}

fn api_url_from_env<F>(env: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match env("DX_APISERVER_HOST") {
        Some(host) => {
            let protocol = env("DX_APISERVER_PROTOCOL").unwrap_or_else(|| "https".to_string());
            match env("DX_APISERVER_PORT") {
                Some(port) => format!("{}://{}:{}", protocol, host, port),
                None => format!("{}://{}", protocol, host),
            }
        }
        None => DEFAULT_API_URL.to_string(),
    }
}

fn token_from_security_context<F>(env: &F) -> Result<Option<String>, PipelineError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match env("DX_SECURITY_CONTEXT") {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let context: SecurityContext = serde_json::from_str(&raw).map_err(|e| PipelineError::Parse {
        source_name: "DX_SECURITY_CONTEXT".to_string(),
        message: e.to_string(),
    })?;
    if let Some(kind) = &context.auth_token_type {
        if !kind.eq_ignore_ascii_case("bearer") {
            return Err(PipelineError::InvalidConfig(format!("Unsupported auth token type: {}", kind)));
        }
    }
    Ok(Some(context.auth_token))
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use clap::Parser;

    fn args(extra: &[&str]) -> Arguments {
        let mut argv = vec!["swgs-cnv-pipelines"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&["align", "/fastqs"]);
        let mut parsed = Arguments::try_parse_from(argv).unwrap();
        // Drop anything picked up from the test runner's environment
        if !extra.contains(&"--token") {
            parsed.token = None;
        }
        if !extra.contains(&"--project") {
            parsed.project = None;
        }
        parsed
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_explicit_arguments_win() {
        let args = args(&["--api-url", "http://localhost:8080/", "--token", "abc", "--project", "project-1"]);
        let env = env_from(&[("DX_APISERVER_HOST", "ignored"), ("DX_PROJECT_CONTEXT_ID", "project-2")]);
        let settings = resolve_platform_settings(&args, env).unwrap();
        assert_eq!(settings, PlatformSettings {
            api_url: "http://localhost:8080".to_string(),
            token: "abc".to_string(),
            project: "project-1".to_string(),
        });
    }

    #[test]
    fn test_security_context_and_defaults() {
        let args = args(&[]);
        let env = env_from(&[("DX_SECURITY_CONTEXT", r#"{"auth_token_type": "Bearer", "auth_token": "tok"}"#)]);
        let settings = resolve_platform_settings(&args, env).unwrap();
        assert_eq!(settings.token, "tok");
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.project, SWGS_PROJECT);
    }

    #[test]
    fn test_api_url_from_host_variables() {
        let args = args(&["--token", "abc"]);
        let env = env_from(&[
            ("DX_APISERVER_PROTOCOL", "http"),
            ("DX_APISERVER_HOST", "dx.local"),
            ("DX_APISERVER_PORT", "8124"),
        ]);
        let settings = resolve_platform_settings(&args, env).unwrap();
        assert_eq!(settings.api_url, "http://dx.local:8124");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let args = args(&[]);
        let res = resolve_platform_settings(&args, env_from(&[]));
        assert!(matches!(res, Err(PipelineError::InvalidConfig(_))));
    }
}
