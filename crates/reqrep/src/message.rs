//! Message Context (§4.A): a typed view of one HTTP message — method, URI,
//! headers, payload, side, cancellation. Created once per exchange side by
//! the host adapter, mutated only by transforms, discarded at pipeline
//! exit.

use http::HeaderMap;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::payload::Payload;
use crate::plan::Side;

/// The mutable absolute URI a request-side transform may rewrite
/// (scheme/host/port/path/query). On the response side, assignment is
/// accepted but ignored by the host — advisory only (§4.A, open question
/// in §9 resolved that way).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address(Url);

impl Address {
	pub fn parse(s: &str) -> Result<Self, url::ParseError> {
		Ok(Self(Url::parse(s)?))
	}

	pub fn scheme(&self) -> &str {
		self.0.scheme()
	}

	pub fn set_scheme(&mut self, scheme: &str) {
		let _ = self.0.set_scheme(scheme);
	}

	pub fn host(&self) -> Option<&str> {
		self.0.host_str()
	}

	pub fn set_host(&mut self, host: &str) {
		let _ = self.0.set_host(Some(host));
	}

	pub fn port(&self) -> Option<u16> {
		self.0.port()
	}

	pub fn set_port(&mut self, port: Option<u16>) {
		let _ = self.0.set_port(port);
	}

	pub fn path(&self) -> &str {
		self.0.path()
	}

	pub fn set_path(&mut self, path: &str) {
		self.0.set_path(path);
	}

	pub fn query(&self) -> Option<&str> {
		self.0.query()
	}

	pub fn set_query(&mut self, query: Option<&str>) {
		self.0.set_query(query);
	}

	pub fn query_pairs(&self) -> Vec<(String, String)> {
		self
			.0
			.query_pairs()
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect()
	}

	/// Rebuilds the query string from `pairs`, percent-encoding as needed.
	pub fn set_query_pairs<I, K, V>(&mut self, pairs: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let mut out = self.0.clone();
		{
			let mut ser = out.query_pairs_mut();
			ser.clear();
			for (k, v) in pairs {
				ser.append_pair(k.as_ref(), v.as_ref());
			}
		}
		self.0 = out;
	}

	pub fn as_str(&self) -> &str {
		self.0.as_str()
	}
}

impl std::fmt::Display for Address {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// One HTTP message side: method, address, headers, payload, cancellation.
/// `side` never changes after construction; `method` assignment has no
/// observable effect on the response side (§4.A).
pub struct MessageContext {
	method: http::Method,
	address: Address,
	headers: HeaderMap,
	payload: Payload,
	side: Side,
	cancellation: CancellationToken,
}

impl MessageContext {
	pub fn new(
		method: http::Method,
		address: Address,
		headers: HeaderMap,
		payload: Payload,
		side: Side,
		cancellation: CancellationToken,
	) -> Self {
		Self {
			method,
			address,
			headers,
			payload,
			side,
			cancellation,
		}
	}

	pub fn side(&self) -> Side {
		self.side
	}

	pub fn cancellation(&self) -> &CancellationToken {
		&self.cancellation
	}

	pub fn method(&self) -> &http::Method {
		&self.method
	}

	/// No-op on the response side (§4.A).
	pub fn set_method(&mut self, method: http::Method) {
		if self.side == Side::Request {
			self.method = method;
		}
	}

	pub fn address(&self) -> &Address {
		&self.address
	}

	/// Accepted unconditionally; on the response side the host ignores it
	/// (advisory only — §4.A, §9).
	pub fn set_address(&mut self, address: Address) {
		self.address = address;
	}

	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	pub fn headers_mut(&mut self) -> &mut HeaderMap {
		&mut self.headers
	}

	pub fn payload(&self) -> &Payload {
		&self.payload
	}

	pub fn payload_mut(&mut self) -> &mut Payload {
		&mut self.payload
	}

	pub fn into_parts(self) -> (http::Method, Address, HeaderMap, Payload) {
		(self.method, self.address, self.headers, self.payload)
	}
}

/// The view handed to buffered transforms (§4.A, §9 "interface
/// segregation"). Deliberately does not re-export `MessageContext::payload`
/// — only the buffered-face operations are reachable, so a buffered
/// transform has no way to ask for a pipe reader even by accident.
pub struct BufferedView<'a> {
	ctx: &'a mut MessageContext,
}

impl<'a> BufferedView<'a> {
	pub fn new(ctx: &'a mut MessageContext) -> Self {
		Self { ctx }
	}

	pub fn side(&self) -> Side {
		self.ctx.side()
	}

	pub fn cancellation(&self) -> &CancellationToken {
		self.ctx.cancellation()
	}

	pub fn method(&self) -> &http::Method {
		self.ctx.method()
	}

	pub fn set_method(&mut self, method: http::Method) {
		self.ctx.set_method(method);
	}

	pub fn address(&self) -> &Address {
		self.ctx.address()
	}

	pub fn set_address(&mut self, address: Address) {
		self.ctx.set_address(address);
	}

	pub fn headers(&self) -> &HeaderMap {
		self.ctx.headers()
	}

	pub fn headers_mut(&mut self) -> &mut HeaderMap {
		self.ctx.headers_mut()
	}

	pub fn has_body(&self) -> bool {
		self.ctx.payload().has_body()
	}

	pub fn is_json(&self) -> bool {
		self.ctx.payload().is_json()
	}

	pub fn content_type(&self) -> Option<&str> {
		self.ctx.payload().content_type()
	}

	pub async fn get_json(
		&self,
	) -> Result<&parking_lot::Mutex<Option<serde_json::Value>>, crate::error::PayloadAccessViolation> {
		self.ctx.payload().get_json().await
	}

	pub async fn get_buffer(&self) -> Result<bytes::Bytes, crate::error::PayloadAccessViolation> {
		self.ctx.payload().get_buffer().await
	}

	pub fn set_json(
		&self,
		value: serde_json::Value,
	) -> Result<(), crate::error::PayloadAccessViolation> {
		self.ctx.payload().set_json(value)
	}

	pub fn set_buffer(&self, bytes: bytes::Bytes) -> Result<(), crate::error::PayloadAccessViolation> {
		self.ctx.payload().set_buffer(bytes)
	}
}

/// The view handed to streaming transforms: headers and address only, plus
/// the pipe reader / stream-replace pair. No `get_json`/`get_buffer`/
/// `set_json`/`set_buffer` exist on this type at all — a streaming
/// transform cannot even name them (§4.C, §9).
pub struct StreamingView<'a> {
	ctx: &'a mut MessageContext,
}

impl<'a> StreamingView<'a> {
	pub fn new(ctx: &'a mut MessageContext) -> Self {
		Self { ctx }
	}

	pub fn side(&self) -> Side {
		self.ctx.side()
	}

	pub fn cancellation(&self) -> &CancellationToken {
		self.ctx.cancellation()
	}

	pub fn address(&self) -> &Address {
		self.ctx.address()
	}

	pub fn set_address(&mut self, address: Address) {
		self.ctx.set_address(address);
	}

	pub fn headers(&self) -> &HeaderMap {
		self.ctx.headers()
	}

	pub fn headers_mut(&mut self) -> &mut HeaderMap {
		self.ctx.headers_mut()
	}

	pub fn content_type(&self) -> Option<&str> {
		self.ctx.payload().content_type()
	}

	pub fn get_pipe_reader(&self) -> Result<crate::body::Body, crate::error::PayloadAccessViolation> {
		self.ctx.payload().get_pipe_reader()
	}

	pub fn replace_stream(&self, stream: crate::body::Body) {
		self.ctx.payload().replace_stream(stream)
	}
}
