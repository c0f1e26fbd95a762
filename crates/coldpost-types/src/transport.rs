//! Email transport adapter trait
//!
//! The engine sends one email per recipient through this trait and records
//! the outcome. It performs no retries of its own; failures are logged and
//! the campaign moves on to the next recipient.

use async_trait::async_trait;

use crate::prelude::*;

/// A single outbound message, fully personalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
	pub from_address: Box<str>,
	pub from_name: Box<str>,
	pub to_address: Box<str>,
	pub to_name: Box<str>,
	pub subject: Box<str>,
	pub text_body: Box<str>,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
	/// Send one email. `Ok(())` means the provider accepted the message,
	/// not that it was delivered.
	async fn send(&self, email: &OutboundEmail) -> CpResult<()>;
}

// vim: ts=4
