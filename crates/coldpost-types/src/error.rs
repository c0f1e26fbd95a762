//! Error types shared across the workspace

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub type CpResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	/// A campaign is already running; only one may be active at a time
	AlreadyRunning,
	ValidationError(String),
	ConfigError(String),
	ServiceUnavailable(String),
	Internal(String),
	DbError,
	Parse,

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::AlreadyRunning => write!(f, "a campaign is already running"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::ServiceUnavailable(msg) => write!(f, "service unavailable: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::DbError => write!(f, "database error"),
			Error::Parse => write!(f, "parse error"),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let status = match &self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::AlreadyRunning => StatusCode::CONFLICT,
			Error::ValidationError(_) | Error::Parse => StatusCode::BAD_REQUEST,
			Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};
		(status, Json(json!({ "error": self.to_string() }))).into_response()
	}
}

/// Lock a `std::sync::Mutex`, mapping a poisoned lock to `Error::Internal`
#[macro_export]
macro_rules! lock {
	($mutex:expr) => {
		$mutex.lock().map_err(|_| $crate::error::Error::Internal("mutex poisoned".into()))
	};
	($mutex:expr, $name:expr) => {
		$mutex
			.lock()
			.map_err(|_| $crate::error::Error::Internal(format!("mutex poisoned: {}", $name)))
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_messages() {
		assert_eq!(Error::AlreadyRunning.to_string(), "a campaign is already running");
		assert_eq!(
			Error::ValidationError("no valid recipients".into()).to_string(),
			"validation error: no valid recipients"
		);
	}

	#[test]
	fn test_lock_macro() {
		let mutex = std::sync::Mutex::new(5u32);
		let value = lock!(mutex).map(|guard| *guard);
		assert_eq!(value.ok(), Some(5));
	}
}

// vim: ts=4
