//! Core data types shared between the engine, the server, and the adapters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unix timestamp in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Self {
		Self(Utc::now().timestamp())
	}

	pub fn from_now(seconds: i64) -> Self {
		Self(Utc::now().timestamp() + seconds)
	}

	/// Milliseconds elapsed since this timestamp (0 if it lies in the future)
	pub fn elapsed_ms(&self) -> u64 {
		let diff = Utc::now().timestamp() - self.0;
		u64::try_from(diff.max(0)).unwrap_or_default() * 1000
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Serialize a `Timestamp` as an ISO-8601 UTC string
pub fn serialize_timestamp_iso<S: serde::Serializer>(
	ts: &Timestamp,
	serializer: S,
) -> Result<S::Ok, S::Error> {
	let dt = DateTime::<Utc>::from_timestamp(ts.0, 0).unwrap_or_else(Utc::now);
	serializer.serialize_str(&dt.to_rfc3339())
}

/// One entry of a recipient list. `email` is the unique key (compared
/// case-insensitively by the intake step).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
	pub email: Box<str>,
	pub name: Box<str>,
}

impl Recipient {
	pub fn new(email: impl Into<Box<str>>, name: impl Into<Box<str>>) -> Self {
		Self { email: email.into(), name: name.into() }
	}

	/// Part of the address before the '@'
	pub fn local_part(&self) -> &str {
		self.email.split('@').next().unwrap_or(&self.email)
	}

	/// Part of the address after the '@' (empty when malformed)
	pub fn domain(&self) -> &str {
		self.email.split('@').nth(1).unwrap_or("")
	}
}

/// A verified outbound sender address, grouped by domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderIdentity {
	pub address: Box<str>,
	pub display_name: Box<str>,
	pub domain: Box<str>,
}

impl SenderIdentity {
	pub fn new(address: impl Into<Box<str>>, display_name: impl Into<Box<str>>) -> Self {
		let address = address.into();
		let domain = address.split('@').nth(1).unwrap_or("").into();
		Self { address, display_name: display_name.into(), domain }
	}
}

/// Lifecycle state of a campaign run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
	Idle,
	Running,
	Paused,
	Stopped,
	Completed,
}

impl CampaignStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			CampaignStatus::Idle => "idle",
			CampaignStatus::Running => "running",
			CampaignStatus::Paused => "paused",
			CampaignStatus::Stopped => "stopped",
			CampaignStatus::Completed => "completed",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"idle" => Some(CampaignStatus::Idle),
			"running" => Some(CampaignStatus::Running),
			"paused" => Some(CampaignStatus::Paused),
			"stopped" => Some(CampaignStatus::Stopped),
			"completed" => Some(CampaignStatus::Completed),
			_ => None,
		}
	}
}

/// Per-email outcome recorded in the campaign log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
	Sent,
	Failed,
}

impl LogStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogStatus::Sent => "sent",
			LogStatus::Failed => "failed",
		}
	}
}

/// One line of the append-only, capped email log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLogEntry {
	pub recipient: Box<str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<Box<str>>,
	pub status: LogStatus,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub timestamp: Timestamp,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<Box<str>>,
	pub sender: Box<str>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sender_identity_domain() {
		let sender = SenderIdentity::new("sales@acme.com", "Acme Sales");
		assert_eq!(sender.domain.as_ref(), "acme.com");
	}

	#[test]
	fn test_recipient_parts() {
		let r = Recipient::new("john.doe@example.org", "John Doe");
		assert_eq!(r.local_part(), "john.doe");
		assert_eq!(r.domain(), "example.org");
	}

	#[test]
	fn test_status_roundtrip() {
		for status in [
			CampaignStatus::Idle,
			CampaignStatus::Running,
			CampaignStatus::Paused,
			CampaignStatus::Stopped,
			CampaignStatus::Completed,
		] {
			assert_eq!(CampaignStatus::parse(status.as_str()), Some(status));
		}
	}

	#[test]
	fn test_log_entry_serialization() {
		let entry = EmailLogEntry {
			recipient: "a@b.com".into(),
			name: None,
			status: LogStatus::Sent,
			timestamp: Timestamp(0),
			error: None,
			sender: "sales@acme.com".into(),
		};
		let json = serde_json::to_string(&entry).unwrap();
		assert!(json.contains("\"status\":\"sent\""));
		assert!(json.contains("1970-01-01"));
		assert!(!json.contains("\"error\""));
	}
}

// vim: ts=4
