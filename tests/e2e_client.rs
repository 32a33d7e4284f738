mod support_server;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;

use loadflow::auth::{AuthConfig, AuthStep, authenticate};
use loadflow::config::{ProjectConfig, ScenarioKind, load_config_file};
use loadflow::dynamic::DynamicValue;
use loadflow::error::HttpError;
use loadflow::http::{EndpointDescriptor, ExecutionClient, HttpMethod, ReqwestTransport};
use loadflow::metrics::MetricsCollector;
use loadflow::runner::LoadRunner;

use support_server::{closed_port_url, run_async_test, run_loadflow, spawn_api_server};

const TIMEOUT: Duration = Duration::from_secs(5);

fn transport() -> Result<Arc<ReqwestTransport>, String> {
    ReqwestTransport::new(TIMEOUT)
        .map(Arc::new)
        .map_err(|err| err.to_string())
}

#[test]
fn e2e_login_then_chained_calls() -> Result<(), String> {
    let (base_url, _server) = spawn_api_server()?;
    run_async_test(async move {
        let transport = transport()?;
        let login = AuthConfig::JwtSingleStep {
            login_path: "/auth/login".to_owned(),
            payload: json!({"email": "a@b.c", "password": "pw"}),
            token_path: "data.accessToken".to_owned(),
        };
        let token = authenticate(&login, &base_url, transport.as_ref())
            .await
            .into_token()
            .map_err(|err| err.to_string())?
            .ok_or_else(|| "Expected a token".to_owned())?;

        let metrics = Arc::new(MetricsCollector::new());
        let mut client = ExecutionClient::new(base_url.clone(), transport, Arc::clone(&metrics));
        client.set_token(&token).map_err(|err| err.to_string())?;

        let create = EndpointDescriptor::builder("Create Task", HttpMethod::Post, "/api/tasks")
            .body(json!({"title": "Load test"}))
            .extract("taskId", "data.id")
            .build();
        let read = EndpointDescriptor::builder("Get Task", HttpMethod::Get, "/api/tasks/{id}")
            .path_param("id", DynamicValue::json_template(json!("{{taskId}}")))
            .extract("title", "data.title")
            .build();

        client.execute(&create).await.map_err(|err| err.to_string())?;
        let response = client.execute(&read).await.map_err(|err| err.to_string())?;
        if response.status != 200 {
            return Err(format!("Unexpected read response: {:?}", response));
        }
        if client.context().text("title").as_deref() != Some("Load test") {
            return Err(format!("Unexpected context: {:?}", client.context()));
        }
        let statuses: Vec<u16> = metrics.metrics().iter().map(|metric| metric.status).collect();
        if statuses != [201, 200] {
            return Err(format!("Unexpected statuses: {:?}", statuses));
        }
        Ok(())
    })
}

#[test]
fn e2e_multi_step_login() -> Result<(), String> {
    let (base_url, _server) = spawn_api_server()?;
    run_async_test(async move {
        let transport = transport()?;
        let config = AuthConfig::JwtMultiStep {
            steps: vec![
                AuthStep {
                    name: "Request OTP".to_owned(),
                    endpoint: "/auth/otp".to_owned(),
                    payload: DynamicValue::from(json!({"email": "a@b.c"})),
                    extract: [("sessionId".to_owned(), "data.sessionId".to_owned())]
                        .into_iter()
                        .collect(),
                },
                AuthStep {
                    name: "Verify OTP".to_owned(),
                    endpoint: "/auth/verify".to_owned(),
                    payload: DynamicValue::json_template(
                        json!({"sessionId": "{{sessionId}}", "otp": "123456"}),
                    ),
                    extract: Default::default(),
                },
            ],
            token_path: "data.accessToken".to_owned(),
        };
        let result = authenticate(&config, &base_url, transport.as_ref()).await;
        if result.token.as_deref() != Some("tok-2") {
            return Err(format!("Unexpected result: {:?}", result));
        }
        Ok(())
    })
}

#[test]
fn e2e_rejected_requests_are_recorded() -> Result<(), String> {
    let (base_url, _server) = spawn_api_server()?;
    run_async_test(async move {
        let metrics = Arc::new(MetricsCollector::new());
        let mut client = ExecutionClient::new(base_url, transport()?, Arc::clone(&metrics));
        let endpoint = EndpointDescriptor::builder("List Tasks", HttpMethod::Get, "/api/tasks")
            .query_param("page", 1_i64)
            .build();
        let response = client.execute(&endpoint).await.map_err(|err| err.to_string())?;
        if response.status != 401 {
            return Err(format!("Expected 401 without a token, got {}", response.status));
        }
        let summary = metrics.summary();
        if summary.requests != 1 || summary.error_rate() != "100.00" {
            return Err(format!("Unexpected summary: {:?}", summary));
        }
        Ok(())
    })
}

#[test]
fn e2e_unreachable_server_is_a_transport_error() -> Result<(), String> {
    let base_url = closed_port_url()?;
    run_async_test(async move {
        let metrics = Arc::new(MetricsCollector::new());
        let mut client = ExecutionClient::new(base_url, transport()?, Arc::clone(&metrics));
        let endpoint = EndpointDescriptor::builder("Health", HttpMethod::Get, "/health").build();
        match client.execute(&endpoint).await {
            Err(HttpError::Transport { .. }) => {}
            other => return Err(format!("Expected transport error, got {:?}", other)),
        }
        if !metrics.is_empty() {
            return Err("Transport errors must not be recorded".to_owned());
        }
        Ok(())
    })
}

fn project_toml(base_url: &str) -> String {
    format!(
        r#"
name = "tasks-api"
base_url = "{}"

[load]
vus = 2
duration = "300ms"
think_time = "10ms"
scenario = "flow"

[auth]
type = "jwt"
login_path = "/auth/login"
payload = {{ email = "a@b.c", password = "pw" }}
token_path = "data.accessToken"

[[endpoints]]
name = "Create Task"
method = "POST"
url = "/api/tasks"
body = {{ title = "Load test" }}
extract = {{ taskId = "data.id" }}
require = "data.id"

[[endpoints]]
name = "Get Task"
method = "GET"
url = "/api/tasks/{{{{taskId}}}}"

[[endpoints]]
name = "Delete Task"
method = "DELETE"
url = "/api/tasks/{{id}}"
path_params = {{ id = "{{{{taskId}}}}" }}
"#,
        base_url
    )
}

#[test]
fn e2e_runner_from_config_file() -> Result<(), String> {
    let (base_url, _server) = spawn_api_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("loadflow.toml");
    std::fs::write(&path, project_toml(&base_url)).map_err(|err| format!("write failed: {}", err))?;

    run_async_test(async move {
        let file = load_config_file(&path).map_err(|err| err.to_string())?;
        let project = ProjectConfig::try_from(file).map_err(|err| err.to_string())?;
        let runner = LoadRunner::new(project, transport()?);
        let report = runner
            .run(ScenarioKind::Flow)
            .await
            .map_err(|err| err.to_string())?;

        if report.summary.requests == 0 || report.iterations == 0 {
            return Err(format!("Nothing ran: {:?}", report));
        }
        if report.summary.error_rate_x100 != 0 {
            return Err(format!("Unexpected errors: {:?}", report.endpoints));
        }
        let names: Vec<&str> = report.endpoints.iter().map(|e| e.name.as_str()).collect();
        if names.first() != Some(&"Create Task") {
            return Err(format!("Unexpected breakdown: {:?}", names));
        }
        Ok(())
    })
}

#[test]
fn e2e_cli_runs_project() -> Result<(), String> {
    let (base_url, _server) = spawn_api_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("project.toml");
    std::fs::write(&path, project_toml(&base_url)).map_err(|err| format!("write failed: {}", err))?;

    let output = run_loadflow([
        "--config",
        path.to_string_lossy().as_ref(),
        "--vus",
        "1",
        "--duration",
        "200ms",
        "--no-color",
    ])?;
    if !output.status.success() {
        return Err(format!(
            "stdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Requests:") {
        return Err(format!("Summary missing from output: {}", stdout));
    }
    Ok(())
}

#[test]
fn e2e_cli_fails_on_bad_credentials() -> Result<(), String> {
    let (base_url, _server) = spawn_api_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("project.toml");
    let content = project_toml(&base_url).replace("password = \"pw\"", "password = \"wrong\"");
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let output = run_loadflow(["--config", path.to_string_lossy().as_ref(), "--no-color"])?;
    if output.status.success() {
        return Err("Run should abort when login fails".to_owned());
    }
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    if !combined.contains("401") {
        return Err(format!("Login status missing from output: {}", combined));
    }
    Ok(())
}
