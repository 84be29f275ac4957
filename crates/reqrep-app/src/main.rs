//! Sample host binary (§4.G, §5 supplemental CLI): the concrete Host
//! Adapter Surface — axum extractors in, a plain hyper client out — built
//! on top of the [`reqrep`] pipeline engine. Demonstrates the contract the
//! core crate assumes a host upholds; it is not itself part of the engine.

mod config;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body as AxumBody;
use axum::extract::{Request, State};
use axum::response::Response;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use http_body_util::BodyExt;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use reqrep::{
	Address, DetailBuilder, DetailProvider, Executor, ExecutorError, FailureModeSetting, InMemoryDetailProvider, MessageContext, Payload,
	Registry, Side,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "reqrep-gateway", version)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Runs the transformation gateway.
	Serve {
		/// Path to the `reqRepTransformation` YAML config.
		#[arg(long)]
		config: Option<std::path::PathBuf>,
		/// Path to the route row file (§6 persistence row format).
		#[arg(long)]
		routes: Option<std::path::PathBuf>,
		/// Address to listen on.
		#[arg(long, default_value = "127.0.0.1:8080")]
		listen: SocketAddr,
		/// The single backend every request is forwarded to (no
		/// routing/dispatch is in scope — see Non-goals).
		#[arg(long)]
		backend: http::Uri,
	},
}

struct AppState {
	provider: Arc<dyn DetailProvider>,
	executor: Executor,
	backend: http::Uri,
	client: Client<HttpConnector, AxumBody>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	reqrep_core::telemetry::init("info")?;
	let cli = Cli::parse();

	match cli.command {
		Command::Serve {
			config,
			routes,
			listen,
			backend,
		} => serve(config, routes, listen, backend).await,
	}
}

async fn serve(
	config: Option<std::path::PathBuf>,
	routes: Option<std::path::PathBuf>,
	listen: SocketAddr,
	backend: http::Uri,
) -> anyhow::Result<()> {
	let options = Arc::new(config::load(config.as_deref())?);
	let rows = match &routes {
		Some(path) => store::load_routes(path)?,
		None => Vec::new(),
	};

	let mut metrics_registry = reqrep_core::metrics::new_registry("reqrep");
	let metrics = reqrep::telemetry::Metrics::register(&mut metrics_registry);

	let registry = Arc::new(Registry::builtin());
	let builder = DetailBuilder::new(
		registry,
		options.default_timeout,
		FailureModeSetting::unset(),
		false,
	);
	let provider: Arc<dyn DetailProvider> = Arc::new(InMemoryDetailProvider::new(rows, builder));
	let executor = Executor::new(options, metrics);

	let client: Client<HttpConnector, AxumBody> = Client::builder(hyper_util::rt::TokioExecutor::new()).build(HttpConnector::new());

	let state = Arc::new(AppState {
		provider,
		executor,
		backend,
		client,
	});

	let app = axum::Router::new().fallback(handle).with_state(state);

	info!(%listen, "reqrep-gateway binding listener");
	let listener = tokio::net::TcpListener::bind(listen).await?;
	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;
	info!("reqrep-gateway shut down");
	Ok(())
}

async fn shutdown_signal() {
	let _ = tokio::signal::ctrl_c().await;
	info!("reqrep-gateway received shutdown signal");
}

/// Implements the §4.G/§9 data-flow end to end: resolve a plan, run the
/// request pipeline, forward to the backend, swap in a buffered response
/// sink while capturing bytes, run the response pipeline, flush, and
/// reconcile `Content-Length` — exactly the sequence spec.md's data-flow
/// line describes.
async fn handle(State(state): State<Arc<AppState>>, request: Request) -> Response {
	let cancel = CancellationToken::new();
	let method = request.method().clone();
	let path = request.uri().path().to_string();

	let plan = match state.provider.resolve(method.as_str(), &path).await {
		Ok(plan) => plan,
		Err(err) => {
			error!(error = %err, "detail provider failed to resolve a plan; forwarding untransformed");
			reqrep::Plan::empty()
		},
	};

	let (parts, body) = request.into_parts();
	let content_type = parts
		.headers
		.get(http::header::CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.map(str::to_string);

	let address = match Address::parse(&format!("http://backend.internal{path}")) {
		Ok(a) => a,
		Err(err) => return gateway_error(&format!("invalid request path: {err}")),
	};

	let body = body.map_err(anyhow::Error::from).boxed();
	let payload = Payload::from_reader(content_type, true, body);
	let mut request_ctx = MessageContext::new(method.clone(), address, parts.headers, payload, Side::Request, cancel.clone());

	if let Err(err) = state.executor.run_request(&mut request_ctx, &plan).await {
		return match err {
			ExecutorError::StopPipeline(failure) => gateway_error(&failure.to_string()),
			ExecutorError::Aborted => gateway_error("request aborted"),
		};
	}

	let (method, address, headers, payload) = request_ctx.into_parts();
	let body_bytes = match payload.flush().await {
		Ok(bytes) => bytes,
		Err(err) => return gateway_error(&format!("failed to flush request payload: {err}")),
	};

	let path_and_query = match address.query() {
		Some(q) => format!("{}?{q}", address.path()),
		None => address.path().to_string(),
	};
	let mut backend_uri_parts = state.backend.clone().into_parts();
	backend_uri_parts.path_and_query = match path_and_query.parse() {
		Ok(p) => Some(p),
		Err(err) => return gateway_error(&format!("invalid rewritten path: {err}")),
	};
	let backend_uri = match http::Uri::from_parts(backend_uri_parts) {
		Ok(u) => u,
		Err(err) => return gateway_error(&format!("failed to build backend URI: {err}")),
	};

	let mut forward = http::Request::builder().method(method.clone()).uri(backend_uri);
	*forward.headers_mut().unwrap() = headers;
	let forward = match forward.body(AxumBody::from(body_bytes)) {
		Ok(r) => r,
		Err(err) => return gateway_error(&format!("failed to build backend request: {err}")),
	};

	let backend_response = match state.client.request(forward).await {
		Ok(r) => r,
		Err(err) => {
			error!(error = %err, "backend request failed");
			return gateway_error(&format!("backend request failed: {err}"));
		},
	};

	let (backend_parts, backend_body) = backend_response.into_parts();
	let captured = match backend_body.collect().await {
		Ok(c) => c.to_bytes(),
		Err(err) => return gateway_error(&format!("failed to read backend response: {err}")),
	};

	let response_content_type = backend_parts
		.headers
		.get(http::header::CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.map(str::to_string);

	let response_address = match Address::parse(&format!("http://backend.internal{path}")) {
		Ok(a) => a,
		Err(err) => return gateway_error(&format!("invalid response address: {err}")),
	};

	let response_payload = Payload::from_buffer(response_content_type, captured.clone());
	let mut response_ctx = MessageContext::new(method, response_address, backend_parts.headers, response_payload, Side::Response, cancel);

	if let Err(err) = state.executor.run_response(&mut response_ctx, &plan).await {
		return match err {
			ExecutorError::StopPipeline(failure) => gateway_error_with_fallback(&failure.to_string(), &captured),
			ExecutorError::Aborted => gateway_error("response aborted"),
		};
	}

	let (_, _, mut response_headers, response_payload) = response_ctx.into_parts();
	let flushed = match response_payload.flush().await {
		Ok(bytes) => bytes,
		Err(err) => return gateway_error(&format!("failed to flush response payload: {err}")),
	};
	reqrep::host::reconcile_content_length(&mut response_headers, &flushed);

	let mut response = Response::builder().status(backend_parts.status);
	*response.headers_mut().unwrap() = response_headers;
	response.body(AxumBody::from(flushed)).unwrap_or_else(|_| gateway_error("failed to build response"))
}

/// §6 "Gateway error response": plain-text 502 naming the failing
/// transform.
fn gateway_error(detail: &str) -> Response {
	Response::builder()
		.status(http::StatusCode::BAD_GATEWAY)
		.header(http::header::CONTENT_TYPE, "text/plain")
		.body(AxumBody::from(format!("Gateway error: {detail}.")))
		.expect("static response is well-formed")
}

/// On response-side failure the host may serve the original captured body
/// as a fallback instead of a bare error page (spec.md §6).
fn gateway_error_with_fallback(detail: &str, original: &Bytes) -> Response {
	error!(error = %detail, "response transformation failed; serving original backend body");
	Response::builder()
		.status(http::StatusCode::BAD_GATEWAY)
		.body(AxumBody::from(original.clone()))
		.expect("static response is well-formed")
}
