//! Tests for the chat pipeline

use super::*;
use campus_llm::stream::collect;
use campus_llm::{MockProvider, MockReply, OpenAiConfig, OpenAiProvider, RouteTier, RoutingConfig};
use serde_json::json;

fn routing(smart_routing: bool) -> RoutingConfig {
    RoutingConfig {
        smart_routing,
        cloud_escalation: false,
        cloud_credential: false,
        default_model: "default-m".to_string(),
        fast_model: "fast-m".to_string(),
        balanced_model: "balanced-m".to_string(),
        quality_model: "quality-m".to_string(),
        cloud_model: "cloud-m".to_string(),
    }
}

struct Harness {
    pipeline: ChatPipeline,
    local: MockProvider,
    cloud: MockProvider,
    state: Arc<ServerState>,
}

fn harness(config: PipelineConfig, routing: RoutingConfig) -> Harness {
    let local = MockProvider::new(Provider::Local);
    let cloud = MockProvider::new(Provider::Cloud);
    let state = Arc::new(ServerState::default());
    let pipeline = ChatPipeline::new(
        config,
        RouteSelector::new(routing),
        Arc::new(local.clone()),
        Arc::new(cloud.clone()),
        Arc::clone(&state),
    );
    Harness {
        pipeline,
        local,
        cloud,
        state,
    }
}

fn chat(text: &str) -> String {
    let body = json!({"messages": [{"role": "user", "content": text}]});
    body.to_string()
}

struct Run {
    text: String,
    outcome: ChatOutcome,
    cache: CacheStatus,
    decision: Option<RouteDecision>,
}

async fn run_body(pipeline: &ChatPipeline, body: Result<&[u8]>) -> Run {
    let plan = pipeline.prepare(body);
    let cache = plan.cache_status();
    let decision = plan.decision().cloned();
    let (sink, rx) = DeltaSink::channel(8);
    let (outcome, text) = tokio::join!(pipeline.execute(plan, sink), collect(rx));
    Run {
        text,
        outcome,
        cache,
        decision,
    }
}

async fn run(pipeline: &ChatPipeline, body: &str) -> Run {
    run_body(pipeline, Ok(body.as_bytes())).await
}

#[test]
fn test_parse_body_rules() {
    assert_eq!(parse_body(b"", 10).unwrap(), json!({}));
    assert!(matches!(parse_body(b"{nope", 100), Err(Error::InvalidBody)));
    assert!(matches!(
        parse_body(&[b' '; 11], 10),
        Err(Error::BodyTooLarge)
    ));
    assert_eq!(parse_body(b"[1]", 10).unwrap(), json!([1]));
}

#[tokio::test(start_paused = true)]
async fn test_smart_routing_disabled_uses_default_model() {
    let h = harness(PipelineConfig::default(), routing(false));
    h.local.push_stream(["Hi", " there"]);

    let long = format!("compare rust ```x``` {}", "y".repeat(1000));
    let result = run(&h.pipeline, &chat(&long)).await;

    let decision = result.decision.unwrap();
    assert_eq!(decision.provider, Provider::Local);
    assert_eq!(decision.model, "default-m");
    assert_eq!(decision.tier, RouteTier::Default);
    assert_eq!(result.text, "Hi there");
    assert_eq!(result.outcome, ChatOutcome::Generated);
    assert_eq!(h.local.calls()[0].model, "default-m");
    assert_eq!(h.cloud.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_quality_tier_for_long_code_benchmark() {
    let h = harness(PipelineConfig::default(), routing(true));
    let mut latest = String::from("Please benchmark this:\n```\nfn main() {}\n```\n");
    while latest.chars().count() < 950 {
        latest.push('z');
    }
    let body = json!({"messages": [
        {"role": "user", "content": "first"},
        {"role": "assistant", "content": "reply"},
        {"role": "user", "content": latest},
    ]})
    .to_string();

    let result = run(&h.pipeline, &body).await;
    let decision = result.decision.unwrap();
    assert_eq!(decision.tier, RouteTier::Quality);
    assert_eq!(decision.reason, "complexity=8");
    assert_eq!(h.local.calls()[0].model, "quality-m");
}

#[tokio::test(start_paused = true)]
async fn test_cloud_without_key_streams_fallback() {
    let config = PipelineConfig {
        mode: Mode::Cloud,
        cloud_model: "cloud-m".to_string(),
        ..PipelineConfig::default()
    };
    let state = Arc::new(ServerState::default());
    let cloud = OpenAiProvider::new(OpenAiConfig::default()).unwrap();
    let pipeline = ChatPipeline::new(
        config,
        RouteSelector::new(routing(true)),
        Arc::new(MockProvider::new(Provider::Local)),
        Arc::new(cloud),
        Arc::clone(&state),
    );

    let result = run(&pipeline, &chat("hello")).await;

    assert_eq!(result.outcome, ChatOutcome::Fallback);
    assert_eq!(result.decision.unwrap().tier, RouteTier::ForcedCloud);
    assert_eq!(
        result.text,
        "Runtime fallback response: CLOUD_API_KEY not set. \
         Infrastructure is running; model path can be retried automatically. "
    );
    assert_eq!(state.last_route(), "cloud:cloud-m:forced-cloud:mode=cloud");
    assert_eq!(state.metrics().snapshot().fallback_responses_total, 1);
    assert_eq!(state.cache_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_adapter_is_picked_by_kind() {
    let config = PipelineConfig {
        mode: Mode::Cloud,
        ..PipelineConfig::default()
    };
    let cloud = MockProvider::new(Provider::Cloud);
    cloud.push_stream(["from cloud"]);
    // handed over in swapped positions
    let pipeline = ChatPipeline::new(
        config,
        RouteSelector::new(routing(true)),
        Arc::new(cloud.clone()),
        Arc::new(MockProvider::new(Provider::Local)),
        Arc::new(ServerState::default()),
    );

    let result = run(&pipeline, &chat("hello")).await;
    assert_eq!(result.outcome, ChatOutcome::Generated);
    assert_eq!(result.text, "from cloud");
    assert_eq!(cloud.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_adapter_kind_falls_back() {
    let config = PipelineConfig {
        mode: Mode::Cloud,
        ..PipelineConfig::default()
    };
    let local = MockProvider::new(Provider::Local);
    let pipeline = ChatPipeline::new(
        config,
        RouteSelector::new(routing(true)),
        Arc::new(local.clone()),
        Arc::new(MockProvider::new(Provider::Local)),
        Arc::new(ServerState::default()),
    );

    let result = run(&pipeline, &chat("hello")).await;
    let expected = "Runtime fallback response: no cloud adapter configured.";
    assert_eq!(result.outcome, ChatOutcome::Fallback);
    assert!(result.text.starts_with(expected));
    assert_eq!(local.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_second_identical_request_is_replayed_from_cache() {
    let h = harness(PipelineConfig::default(), routing(true));
    h.local.push_stream(["Hello", " world"]);

    let first = run(&h.pipeline, &chat("say hello")).await;
    assert_eq!(first.cache, CacheStatus::Miss);
    assert_eq!(first.text, "Hello world");

    let second = run(&h.pipeline, &chat("say hello")).await;
    assert_eq!(second.cache, CacheStatus::Hit);
    assert_eq!(second.outcome, ChatOutcome::Replayed);
    assert_eq!(second.text, "Hello world ");
    assert_eq!(h.local.call_count(), 1);

    let metrics = h.state.metrics().snapshot();
    assert_eq!(metrics.cache_hits_total, 1);
    assert_eq!(metrics.cache_misses_total, 1);
    assert_eq!(metrics.chat_requests_total, 2);
}

#[tokio::test(start_paused = true)]
async fn test_long_answers_are_not_cached() {
    let h = harness(PipelineConfig::default(), routing(true));
    h.local.push_stream(["x".repeat(6000)]);
    h.local.push_stream(["y".repeat(5999)]);

    run(&h.pipeline, &chat("first")).await;
    assert_eq!(h.state.cache_len(), 0);

    run(&h.pipeline, &chat("second")).await;
    assert_eq!(h.state.cache_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_failure_falls_back_without_caching() {
    let h = harness(PipelineConfig::default(), routing(true));
    h.local.push_failure("Ollama error 500");

    let result = run(&h.pipeline, &chat("hi")).await;
    assert_eq!(result.outcome, ChatOutcome::Fallback);
    assert!(result
        .text
        .starts_with("Runtime fallback response: Ollama error 500."));
    assert_eq!(h.state.cache_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_appends_to_partial_stream() {
    let h = harness(PipelineConfig::default(), routing(true));
    let reply = MockReply::Partial(vec!["partial ".into()], "cut off".into());
    h.local.push_reply(reply);

    let result = run(&h.pipeline, &chat("hi")).await;
    assert!(result
        .text
        .starts_with("partial Runtime fallback response: cut off."));
}

#[tokio::test(start_paused = true)]
async fn test_upstream_timeout_falls_back() {
    let config = PipelineConfig {
        upstream_timeout: Some(Duration::from_millis(1500)),
        ..PipelineConfig::default()
    };
    let h = harness(config, routing(true));
    h.local.push_reply(MockReply::Hang);

    let result = run(&h.pipeline, &chat("hi")).await;
    assert_eq!(result.outcome, ChatOutcome::Fallback);
    assert!(result.text.contains("upstream timeout after 1500ms"));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_and_oversized_bodies_fall_back() {
    let h = harness(
        PipelineConfig {
            body_limit: 64,
            ..PipelineConfig::default()
        },
        routing(true),
    );

    let invalid = run(&h.pipeline, "{not json").await;
    assert!(invalid.decision.is_none());
    assert!(invalid
        .text
        .starts_with("Runtime fallback response: Invalid JSON body."));

    let large = run(&h.pipeline, &chat(&"a".repeat(100))).await;
    assert!(large
        .text
        .starts_with("Runtime fallback response: Request body too large."));

    let transport = run_body(&h.pipeline, Err(Error::BodyTooLarge)).await;
    assert_eq!(transport.outcome, ChatOutcome::Fallback);

    assert_eq!(h.local.call_count(), 0);
    assert_eq!(h.state.last_route(), "");
}

#[tokio::test(start_paused = true)]
async fn test_empty_body_routes_empty_window_and_skips_cache() {
    let h = harness(PipelineConfig::default(), routing(true));
    h.local.push_stream(["ok"]);
    h.local.push_stream(["ok again"]);

    let first = run(&h.pipeline, "").await;
    assert_eq!(first.decision.unwrap().tier, RouteTier::Fast);
    assert_eq!(h.local.calls()[0].messages, 1);

    let second = run(&h.pipeline, "").await;
    assert_eq!(second.cache, CacheStatus::Miss);
    assert_eq!(h.local.call_count(), 2);
    assert_eq!(h.state.cache_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_records_truncated_query_and_route() {
    let h = harness(PipelineConfig::default(), routing(true));
    run(&h.pipeline, &chat(&"q".repeat(1000))).await;

    assert_eq!(h.state.last_query(), "q".repeat(120));
    assert_eq!(
        h.state.last_route(),
        "local:balanced-m:balanced:complexity=4"
    );
}

#[tokio::test(start_paused = true)]
async fn test_cache_prefix_collision_replays_earlier_answer() {
    let h = harness(PipelineConfig::default(), routing(false));
    h.local.push_stream(["first answer"]);

    let common = "p".repeat(500);
    run(&h.pipeline, &chat(&format!("{common} one"))).await;
    let second = run(&h.pipeline, &chat(&format!("{common} two"))).await;

    assert_eq!(second.cache, CacheStatus::Hit);
    assert_eq!(second.text, "first answer ");
    assert_eq!(h.local.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_client_disconnect_skips_cache_and_fallback() {
    let h = harness(PipelineConfig::default(), routing(true));
    h.local.push_stream(["never", " read"]);

    let plan = h.pipeline.prepare(Ok(chat("hi").as_bytes()));
    let (sink, rx) = DeltaSink::channel(1);
    drop(rx);

    assert_eq!(
        h.pipeline.execute(plan, sink).await,
        ChatOutcome::Disconnected
    );
    assert_eq!(h.state.cache_len(), 0);
    assert_eq!(h.state.metrics().snapshot().fallback_responses_total, 0);
}
