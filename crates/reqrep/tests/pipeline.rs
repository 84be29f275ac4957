//! End-to-end pipeline scenarios (spec.md §8 "Concrete scenarios"),
//! exercised through the public `reqrep` surface: build a plan via the
//! registry/builder, run it through the executor, inspect the resulting
//! context — no host framework involved.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Method;
use reqrep::error::TransformError;
use reqrep::telemetry::Metrics;
use reqrep::{
	Address, AnyTransform, BufferedTransform, BufferedView, DetailBuilder, Executor, ExecutorError, FailureMode, FailureModeSetting,
	GlobalOptions, MessageContext, Payload, Plan, PlanEntry, Registry, RouteEntry, Side,
};
use tokio_util::sync::CancellationToken;

fn row(method: &str, path: &str, key: &str, side: Side, order: i64, params: Option<&str>) -> RouteEntry {
	RouteEntry {
		method: method.to_string(),
		path: path.to_string(),
		transformer_key: key.to_string(),
		side,
		order,
		params_json: params.map(str::to_string),
	}
}

fn executor(global_default: FailureMode) -> Executor {
	let mut registry = reqrep_core::metrics::new_registry("pipeline_tests");
	let options = Arc::new(GlobalOptions {
		default_failure_mode: global_default,
		..GlobalOptions::default()
	});
	Executor::new(options, Metrics::register(&mut registry))
}

fn builder(failure_mode: FailureModeSetting) -> DetailBuilder {
	DetailBuilder::new(Arc::new(Registry::builtin()), Duration::from_secs(5), failure_mode, false)
}

fn ctx(method: Method, path: &str, side: Side, payload: Payload) -> MessageContext {
	MessageContext::new(
		method,
		Address::parse(&format!("http://backend.internal{path}")).unwrap(),
		http::HeaderMap::new(),
		payload,
		side,
		CancellationToken::new(),
	)
}

fn fake_jwt(sub: &str, email: &str) -> String {
	use base64::Engine;
	let header = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
	let claims = format!(r#"{{"sub":"{sub}","email":"{email}"}}"#);
	let claims = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(claims.as_bytes());
	format!("{header}.{claims}.")
}

#[derive(Debug)]
struct AlwaysFails;

#[async_trait::async_trait]
impl BufferedTransform for AlwaysFails {
	fn name(&self) -> &str {
		"always-fails"
	}

	fn should_apply(&self, _ctx: &BufferedView<'_>) -> bool {
		true
	}

	async fn apply(&self, _ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		Err(TransformError::other("synthetic failure for scenario testing"))
	}
}

fn always_fails_entry(order: i64) -> PlanEntry {
	PlanEntry {
		order,
		transform: Arc::new(AnyTransform::Buffered(Arc::new(AlwaysFails))),
	}
}

#[tokio::test]
async fn scenario_1_correlation_request_jwt_and_gateway_metadata() {
	let rows = vec![
		row("POST", "/api/orders", "correlation-id", Side::Request, 10, None),
		row("POST", "/api/orders", "request-id", Side::Request, 20, None),
		row("POST", "/api/orders", "jwt-passthrough", Side::Request, 30, None),
		row(
			"POST",
			"/api/orders",
			"jwt-claim-extraction",
			Side::Request,
			40,
			Some(r#"{"claims":"sub=X-User-Id|email=X-User-Email"}"#),
		),
		row("POST", "/api/orders", "gateway-metadata", Side::Request, 50, None),
	];
	let plan = builder(FailureModeSetting::unset()).build(rows);

	let mut c = ctx(
		Method::POST,
		"/api/orders",
		Side::Request,
		Payload::from_buffer(Some("application/json".to_string()), Bytes::from_static(br#"{"order":"ABC"}"#)),
	);
	c
		.headers_mut()
		.insert(http::header::AUTHORIZATION, format!("Bearer {}", fake_jwt("u123", "a@b")).parse().unwrap());

	executor(FailureMode::LogAndSkip).run_request(&mut c, &plan).await.unwrap();

	let headers = c.headers();
	assert_eq!(headers.get("X-Correlation-Id").unwrap().len(), 32);
	assert_eq!(headers.get("X-Request-Id").unwrap().len(), 32);
	assert_eq!(headers.get("X-User-Id").unwrap(), "u123");
	assert_eq!(headers.get("X-User-Email").unwrap(), "a@b");
	assert!(headers.get(http::header::AUTHORIZATION).is_some());

	let json_cell = c.payload().get_json().await.unwrap();
	let value = json_cell.lock().clone().unwrap();
	let gateway = value.get("_gateway").expect("_gateway object present");
	assert!(gateway.get("version").is_some());
	assert!(gateway.get("processedAt").is_some());
	assert_eq!(gateway.get("requestId").unwrap().as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn scenario_2_path_prefix_rewrite() {
	let rows = vec![
		row("GET", "/api/products", "correlation-id", Side::Request, 10, None),
		row("GET", "/api/products", "jwt-passthrough", Side::Request, 20, None),
		row(
			"GET",
			"/api/products",
			"path-prefix-rewrite",
			Side::Request,
			30,
			Some(r#"{"from":"/api/products","to":"/catalog"}"#),
		),
	];
	let plan = builder(FailureModeSetting::unset()).build(rows);

	let mut c = ctx(Method::GET, "/api/products", Side::Request, Payload::empty());
	executor(FailureMode::LogAndSkip).run_request(&mut c, &plan).await.unwrap();
	assert_eq!(c.address().path(), "/catalog");
}

#[tokio::test]
async fn scenario_3_stop_pipeline_surfaces_transformation_failure() {
	let rows = vec![
		row("GET", "/api/admin", "correlation-id", Side::Request, 10, None),
		row("GET", "/api/admin", "strip-authorization", Side::Request, 20, None),
		row(
			"GET",
			"/api/admin",
			"add-header",
			Side::Request,
			30,
			Some(r#"{"name":"X-Internal-Key","value":"secret"}"#),
		),
	];
	let plan = builder(FailureModeSetting::explicit(FailureMode::StopPipeline)).build(rows);

	let mut c = ctx(Method::GET, "/api/admin", Side::Request, Payload::empty());
	c.headers_mut().insert(http::header::AUTHORIZATION, "Bearer xyz".parse().unwrap());

	executor(FailureMode::LogAndSkip).run_request(&mut c, &plan).await.unwrap();
	assert!(c.headers().get(http::header::AUTHORIZATION).is_none());
	assert_eq!(c.headers().get("X-Internal-Key").unwrap(), "secret");

	// replacing the last entry with a transform forced to fail demonstrates the
	// StopPipeline half of the scenario: the failure surfaces as `TransformationFailure`
	// named after the failing transform, on the request side.
	let failing_plan = Plan::new(
		vec![always_fails_entry(20)],
		vec![],
		Duration::from_secs(5),
		FailureModeSetting::explicit(FailureMode::StopPipeline),
		false,
	);
	let mut c2 = ctx(Method::GET, "/api/admin", Side::Request, Payload::empty());
	let err = executor(FailureMode::LogAndSkip).run_request(&mut c2, &failing_plan).await.unwrap_err();
	match err {
		ExecutorError::StopPipeline(failure) => {
			assert_eq!(failure.transform_name, "always-fails");
			assert_eq!(failure.side, Side::Request);
		},
		ExecutorError::Aborted => panic!("expected StopPipeline"),
	}
}

#[tokio::test]
async fn scenario_4_execution_follows_order_not_insertion() {
	let rows = vec![
		row("GET", "/x", "add-header", Side::Request, 30, Some(r#"{"name":"X-Third","value":"3"}"#)),
		row("GET", "/x", "add-header", Side::Request, 10, Some(r#"{"name":"X-First","value":"1"}"#)),
		row("GET", "/x", "add-header", Side::Request, 20, Some(r#"{"name":"X-Second","value":"2"}"#)),
	];
	let plan = builder(FailureModeSetting::unset()).build(rows);
	assert_eq!(plan.entries(Side::Request).iter().map(|e| e.order).collect::<Vec<_>>(), vec![10, 20, 30]);

	let mut c = ctx(Method::GET, "/x", Side::Request, Payload::empty());
	executor(FailureMode::LogAndSkip).run_request(&mut c, &plan).await.unwrap();
	assert_eq!(c.headers().get("X-First").unwrap(), "1");
	assert_eq!(c.headers().get("X-Second").unwrap(), "2");
	assert_eq!(c.headers().get("X-Third").unwrap(), "3");
}

#[tokio::test]
async fn scenario_5_log_and_skip_runs_the_remaining_entry_after_a_failure() {
	let plan = Plan::new(
		vec![always_fails_entry(10), {
			let plan = builder(FailureModeSetting::unset()).build(vec![row(
				"GET",
				"/y",
				"add-header",
				Side::Request,
				20,
				Some(r#"{"name":"X-Second","value":"ran"}"#),
			)]);
			plan.entries(Side::Request)[0].clone()
		}],
		vec![],
		Duration::from_secs(5),
		FailureModeSetting::explicit(FailureMode::LogAndSkip),
		false,
	);

	let mut c = ctx(Method::GET, "/y", Side::Request, Payload::empty());
	executor(FailureMode::StopPipeline).run_request(&mut c, &plan).await.unwrap();
	assert_eq!(c.headers().get("X-Second").unwrap(), "ran");
}

#[tokio::test]
async fn scenario_6_unset_failure_mode_falls_back_to_global_default() {
	let plan = Plan::new(vec![always_fails_entry(10)], vec![], Duration::from_secs(5), FailureModeSetting::unset(), false);

	let mut c = ctx(Method::GET, "/z", Side::Request, Payload::empty());
	let err = executor(FailureMode::StopPipeline).run_request(&mut c, &plan).await.unwrap_err();
	assert!(matches!(err, ExecutorError::StopPipeline(_)));
}
