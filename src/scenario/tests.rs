use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::Instant;

use super::*;
use crate::error::HttpError;
use crate::extract::extract_str;
use crate::http::{EndpointDescriptor, ExecutionClient, HttpMethod};
use crate::metrics::MetricsCollector;
use crate::test_support::{ScriptedTransport, no_response, reply, run_async_test};

fn get(name: &str, url: &str) -> EndpointDescriptor {
    EndpointDescriptor::builder(name, HttpMethod::Get, url).build()
}

fn client(transport: &Arc<ScriptedTransport>) -> (ExecutionClient, Arc<MetricsCollector>) {
    let metrics = Arc::new(MetricsCollector::new());
    let shared = Arc::clone(transport);
    let client = ExecutionClient::new("http://api.test", shared, Arc::clone(&metrics));
    (client, metrics)
}

fn names(metrics: &MetricsCollector) -> Vec<String> {
    metrics
        .metrics()
        .into_iter()
        .map(|metric| metric.endpoint)
        .collect()
}

#[test]
fn simple_scenario_runs_endpoints_in_order() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            if request.url.ends_with("/b") {
                reply(404, "missing")
            } else {
                reply(200, "{}")
            }
        }));
        let (mut client, metrics) = client(&transport);
        let scenario = SimpleScenario::new(vec![get("A", "/a"), get("B", "/b"), get("C", "/c")])
            .with_think_time(Duration::ZERO);

        run_simple_scenario(&mut client, &scenario)
            .await
            .map_err(|err| err.to_string())?;
        if names(&metrics) != ["A", "B", "C"] {
            return Err(format!("Unexpected order: {:?}", names(&metrics)));
        }
        Ok(())
    })
}

#[test]
fn think_time_pauses_between_calls() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(ScriptedTransport::fixed(200, "{}"));
        let (mut client, _) = client(&transport);
        let scenario = SimpleScenario::new(vec![get("A", "/a"), get("B", "/b")])
            .with_think_time(Duration::from_millis(20));

        let started = Instant::now();
        run_simple_scenario(&mut client, &scenario)
            .await
            .map_err(|err| err.to_string())?;
        if started.elapsed() < Duration::from_millis(40) {
            return Err(format!("Finished too early: {:?}", started.elapsed()));
        }
        if SimpleScenario::new(Vec::new()).think_time != DEFAULT_THINK_TIME {
            return Err("Default think time should be one second".to_owned());
        }
        Ok(())
    })
}

#[test]
fn transport_failure_ends_the_pass() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            if request.url.ends_with("/b") {
                Err(no_response(&request.url))
            } else {
                reply(200, "{}")
            }
        }));
        let (mut client, metrics) = client(&transport);
        let scenario = SimpleScenario::new(vec![get("A", "/a"), get("B", "/b"), get("C", "/c")])
            .with_think_time(Duration::ZERO);

        match run_simple_scenario(&mut client, &scenario).await {
            Err(HttpError::Transport { endpoint, .. }) if endpoint == "B" => {}
            other => return Err(format!("Expected transport error at B, got {:?}", other)),
        }
        if names(&metrics) != ["A"] {
            return Err(format!("Unexpected metrics: {:?}", names(&metrics)));
        }
        Ok(())
    })
}

#[test]
fn flow_stops_when_condition_fails() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            if request.url.ends_with("/login") {
                reply(401, r#"{"error": "denied"}"#)
            } else {
                reply(200, "{}")
            }
        }));
        let (mut client, metrics) = client(&transport);
        let mut scenario = login_flow(
            get("Login", "/login"),
            vec![get("Profile", "/me")],
            |body: &Value| extract_str(body, "data.accessToken").map(str::to_owned),
        )
        .with_default_think_time(Duration::ZERO);
        for step in &mut scenario.steps {
            step.think_time = None;
        }

        let outcome = run_flow_scenario(&mut client, &scenario)
            .await
            .map_err(|err| err.to_string())?;
        if outcome != (FlowOutcome::Stopped { step: "Login".to_owned() }) {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        if names(&metrics) != ["Login"] {
            return Err(format!("Protected step should not run: {:?}", names(&metrics)));
        }
        Ok(())
    })
}

#[test]
fn flow_conditions_see_raw_text_bodies() -> Result<(), String> {
    run_async_test(async {
        let transport = Arc::new(ScriptedTransport::fixed(200, "pong"));
        let (mut client, metrics) = client(&transport);
        let scenario = FlowScenario::new(vec![
            FlowStep::new(get("Ping", "/ping"))
                .with_think_time(Duration::ZERO)
                .with_condition(|body| *body == json!("pong")),
            FlowStep::new(get("After", "/after")).with_think_time(Duration::ZERO),
        ]);

        let outcome = run_flow_scenario(&mut client, &scenario)
            .await
            .map_err(|err| err.to_string())?;
        if outcome != FlowOutcome::Completed || names(&metrics) != ["Ping", "After"] {
            return Err(format!("Unexpected run: {:?} {:?}", outcome, names(&metrics)));
        }
        Ok(())
    })
}

#[test]
fn builders_use_expected_pacing() -> Result<(), String> {
    let login = login_flow(
        get("Login", "/login"),
        vec![get("A", "/a"), get("B", "/b")],
        |_: &Value| None,
    );
    let pacing: Vec<Option<Duration>> = login.steps.iter().map(|step| step.think_time).collect();
    let expected = [
        Some(Duration::from_millis(500)),
        Some(Duration::from_secs(1)),
        Some(Duration::from_secs(1)),
    ];
    if pacing != expected || login.steps.first().is_none_or(|step| step.condition.is_none()) {
        return Err(format!("Unexpected login flow: {:?}", login));
    }

    let crud = crud_flow(
        get("Create", "/c"),
        get("Read", "/r"),
        get("Update", "/u"),
        get("Delete", "/d"),
    );
    let names: Vec<&str> = crud.steps.iter().map(|step| step.endpoint.name()).collect();
    if names != ["Create", "Read", "Update", "Delete"] {
        return Err(format!("Unexpected CRUD order: {:?}", names));
    }
    if crud
        .steps
        .iter()
        .any(|step| step.think_time != Some(Duration::from_millis(500)))
        || crud.default_think_time != Duration::from_millis(500)
    {
        return Err(format!("Unexpected CRUD pacing: {:?}", crud));
    }
    Ok(())
}
