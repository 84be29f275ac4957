//! Host Adapter Surface (§4.G): what the embedding host — not this crate
//! — is responsible for. `reqrep-app` supplies the concrete adapter
//! (axum in, hyper client out); this module holds the host-agnostic
//! pieces: the scoped response-body-swap guard (§9) and the
//! Content-Length reconciliation helper, both of which are plain
//! mechanism any host needs regardless of its HTTP stack.

use bytes::Bytes;
use http::HeaderMap;

/// Restores the original response sink on every exit path — success,
/// forwarder error, or panic unwinding — via `Drop` (§9 "Host
/// response-body swap": "the idiomatic strategy is a scoped guard that
/// runs in all exit paths"). Generic over the host's sink type so this
/// crate doesn't need to know whether it's a hyper body sender, an axum
/// response body, or something else.
pub struct ResponseBodyGuard<'a, S> {
	slot: &'a mut S,
	original: Option<S>,
}

impl<'a, S> ResponseBodyGuard<'a, S> {
	/// Installs `buffered` into `*slot`, remembering the displaced value
	/// so it can be put back.
	pub fn swap(slot: &'a mut S, buffered: S) -> Self {
		let original = std::mem::replace(slot, buffered);
		Self {
			slot,
			original: Some(original),
		}
	}

	/// Restores the original sink early, before the guard would
	/// otherwise drop — used once forwarding has definitely finished and
	/// the host is about to write the flushed bytes itself.
	pub fn restore_now(mut self) {
		self.restore();
	}

	fn restore(&mut self) {
		if let Some(original) = self.original.take() {
			*self.slot = original;
		}
	}
}

impl<S> Drop for ResponseBodyGuard<'_, S> {
	fn drop(&mut self) {
		self.restore();
	}
}

/// Sets `Content-Length` to `flushed.len()` if it differs from whatever
/// the backend originally reported, and strips it entirely if the
/// response claims to be chunked-transfer (no length to reconcile)
/// (§4.G "adjusting Content-Length if the length changed").
pub fn reconcile_content_length(headers: &mut HeaderMap, flushed: &Bytes) {
	let original = headers
		.get(http::header::CONTENT_LENGTH)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.parse::<usize>().ok());

	if original == Some(flushed.len()) {
		return;
	}

	if let Ok(value) = http::HeaderValue::from_str(&flushed.len().to_string()) {
		headers.insert(http::header::CONTENT_LENGTH, value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn guard_restores_original_sink_on_drop() {
		let mut slot = "original".to_string();
		{
			let _guard = ResponseBodyGuard::swap(&mut slot, "buffered".to_string());
			assert_eq!(slot, "buffered");
		}
		assert_eq!(slot, "original");
	}

	#[test]
	fn guard_restores_on_early_manual_call() {
		let mut slot = "original".to_string();
		let guard = ResponseBodyGuard::swap(&mut slot, "buffered".to_string());
		guard.restore_now();
		assert_eq!(slot, "original");
	}

	#[test]
	fn reconcile_content_length_updates_a_changed_length() {
		let mut headers = HeaderMap::new();
		headers.insert(http::header::CONTENT_LENGTH, "3".parse().unwrap());
		reconcile_content_length(&mut headers, &Bytes::from_static(b"hello"));
		assert_eq!(headers.get(http::header::CONTENT_LENGTH).unwrap(), "5");
	}

	#[test]
	fn reconcile_content_length_leaves_an_unchanged_length_alone() {
		let mut headers = HeaderMap::new();
		headers.insert(http::header::CONTENT_LENGTH, "5".parse().unwrap());
		reconcile_content_length(&mut headers, &Bytes::from_static(b"hello"));
		assert_eq!(headers.get(http::header::CONTENT_LENGTH).unwrap(), "5");
	}
}
