//! JWT-aware members of the buffered catalog (§4.C): a passthrough no-op
//! kept for its tracing side effect, and claim-to-header projection.
//!
//! Claim extraction never verifies the token's signature — by the time a
//! request reaches this pipeline stage, authentication has already
//! happened upstream (§6 Non-goals: "this is not an authentication
//! system"). It only needs the claims, so it decodes the JWT's middle
//! segment as base64url JSON and never touches the signature.

use base64::Engine;
use http::{HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::TransformError;
use crate::message::BufferedView;
use crate::transform::{BufferedTransform, ParamBag};

fn bearer_token(ctx: &BufferedView<'_>) -> Option<&str> {
	let value = ctx.headers().get(http::header::AUTHORIZATION)?.to_str().ok()?;
	value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))
}

fn decode_claims(token: &str) -> Option<serde_json::Value> {
	// Validates the header segment (alg/typ) without needing a verification
	// key; a token whose header doesn't even parse is certainly malformed.
	jsonwebtoken::decode_header(token).ok()?;
	let claims_segment = token.split('.').nth(1)?;
	let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
		.decode(claims_segment)
		.ok()?;
	serde_json::from_slice(&decoded).ok()
}

/// A no-op that exists only so a route can assert "a JWT was present and
/// well-formed" in its span without mutating anything.
#[derive(Debug, Default)]
pub struct JwtPassthrough;

#[async_trait::async_trait]
impl BufferedTransform for JwtPassthrough {
	fn name(&self) -> &str {
		"jwt-passthrough"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		bearer_token(ctx).is_some()
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let well_formed = bearer_token(ctx).and_then(decode_claims).is_some();
		debug!(well_formed, "jwt-passthrough observed bearer token");
		Ok(())
	}
}

/// Projects named claims onto request headers (`claims` param: pipe-
/// delimited `claim=Header-Name` pairs, e.g. `sub=X-User-Id|email=X-User-
/// Email`). A malformed or unparsable token is skipped silently — the
/// request proceeds with none of its headers set rather than failing the
/// pipeline (§4.C, §6).
#[derive(Debug)]
pub struct JwtClaimExtraction {
	mappings: Vec<(String, String)>,
}

impl JwtClaimExtraction {
	pub fn configure(params: &ParamBag) -> Result<Self, crate::error::MissingParam> {
		let mappings = params.pair_map("claims");
		if mappings.is_empty() {
			return Err(crate::error::MissingParam {
				key: "claims".to_string(),
			});
		}
		Ok(Self { mappings })
	}
}

#[async_trait::async_trait]
impl BufferedTransform for JwtClaimExtraction {
	fn name(&self) -> &str {
		"jwt-claim-extraction"
	}

	fn should_apply(&self, ctx: &BufferedView<'_>) -> bool {
		bearer_token(ctx).is_some()
	}

	async fn apply(&self, ctx: &mut BufferedView<'_>, _cancel: CancellationToken) -> Result<(), TransformError> {
		let Some(token) = bearer_token(ctx).map(str::to_string) else {
			return Ok(());
		};
		let Some(claims) = decode_claims(&token) else {
			debug!("jwt-claim-extraction skipped a malformed token");
			return Ok(());
		};

		for (claim, header) in &self.mappings {
			let Some(value) = claims.get(claim).and_then(|v| v.as_str().map(str::to_string).or_else(|| {
				if v.is_number() || v.is_boolean() {
					Some(v.to_string())
				} else {
					None
				}
			})) else {
				continue;
			};
			let Ok(name) = HeaderName::try_from(header.as_str()) else {
				continue;
			};
			let Ok(value) = HeaderValue::from_str(&value) else {
				continue;
			};
			ctx.headers_mut().insert(name, value);
		}
		Ok(())
	}
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod tests;
