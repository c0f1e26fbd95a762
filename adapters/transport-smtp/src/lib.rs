//! SMTP email transport using lettre
//!
//! One async SMTP connection pool per configured relay. The sender address
//! varies per message (campaigns rotate identities), so the relay must
//! accept every identity in the pool.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use async_trait::async_trait;
use lettre::message::{Mailbox, Message, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::time::Duration;

use coldpost_types::prelude::*;
use coldpost_types::transport::{EmailTransport, OutboundEmail};

/// SMTP relay configuration
#[derive(Debug, Clone)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
	/// `none`, `starttls`, or `tls`
	pub tls_mode: String,
	pub timeout_seconds: u64,
}

impl Default for SmtpConfig {
	fn default() -> Self {
		Self {
			host: "localhost".into(),
			port: 587,
			username: String::new(),
			password: String::new(),
			tls_mode: "starttls".into(),
			timeout_seconds: 30,
		}
	}
}

/// [`EmailTransport`] over an SMTP relay
pub struct SmtpEmailTransport {
	mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailTransport {
	pub fn new(config: &SmtpConfig) -> CpResult<Self> {
		let tls = match config.tls_mode.as_str() {
			"tls" => lettre::transport::smtp::client::Tls::Wrapper(
				lettre::transport::smtp::client::TlsParameters::builder(config.host.clone())
					.build()
					.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?,
			),
			"starttls" => lettre::transport::smtp::client::Tls::Opportunistic(
				lettre::transport::smtp::client::TlsParameters::builder(config.host.clone())
					.build()
					.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?,
			),
			"none" => lettre::transport::smtp::client::Tls::None,
			other => {
				return Err(Error::ConfigError(format!(
					"Invalid TLS mode: {}. Must be 'none', 'starttls', or 'tls'",
					other
				)));
			}
		};

		let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
			.port(config.port)
			.timeout(Some(Duration::from_secs(config.timeout_seconds)))
			.tls(tls);
		if !config.username.is_empty() {
			builder = builder
				.credentials(Credentials::new(config.username.clone(), config.password.clone()));
		}

		Ok(Self { mailer: builder.build() })
	}
}

fn mailbox(name: &str, address: &str) -> CpResult<Mailbox> {
	if !address.contains('@') {
		return Err(Error::ValidationError(format!("Invalid email address: {}", address)));
	}
	let formatted =
		if name.is_empty() { address.to_string() } else { format!("{} <{}>", name, address) };
	formatted
		.parse()
		.map_err(|_| Error::ValidationError(format!("Invalid mailbox format: {}", formatted)))
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
	async fn send(&self, email: &OutboundEmail) -> CpResult<()> {
		let message = Message::builder()
			.from(mailbox(&email.from_name, &email.from_address)?)
			.to(mailbox(&email.to_name, &email.to_address)?)
			.subject(email.subject.as_ref())
			.singlepart(SinglePart::plain(email.text_body.to_string()))
			.map_err(|e| Error::ValidationError(format!("Failed to build email: {}", e)))?;

		match self.mailer.send(message).await {
			Ok(response) => {
				debug!(
					"email accepted for {} from {} (code: {})",
					email.to_address,
					email.from_address,
					response.code()
				);
				Ok(())
			}
			Err(e) => {
				warn!("SMTP send failed for {}: {}", email.to_address, e);
				Err(Error::ServiceUnavailable(format!("SMTP send failed: {}", e)))
			}
		}
	}
}


// vim: ts=4
