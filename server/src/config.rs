//! Environment-driven configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `COLDPOST_LISTEN` | `127.0.0.1:8080` |
//! | `COLDPOST_DATA_DIR` | `./data` |
//! | `COLDPOST_SENDERS` | (required) `Name <a@x.com>; b@y.org; ...` |
//! | `COLDPOST_SMTP_HOST` | `localhost` |
//! | `COLDPOST_SMTP_PORT` | `587` |
//! | `COLDPOST_SMTP_USERNAME` / `COLDPOST_SMTP_PASSWORD` | empty |
//! | `COLDPOST_SMTP_TLS` | `starttls` |
//! | `COLDPOST_SMTP_TIMEOUT` | `30` (seconds) |

use std::{env, path::PathBuf};

use crate::prelude::*;
use coldpost_transport_smtp::SmtpConfig;
use coldpost_types::types::SenderIdentity;

#[derive(Debug, Clone)]
pub struct Config {
	pub listen: String,
	pub db_path: PathBuf,
	pub senders: Vec<SenderIdentity>,
	pub smtp: SmtpConfig,
}

impl Config {
	pub fn from_env() -> CpResult<Self> {
		let data_dir = PathBuf::from(env::var("COLDPOST_DATA_DIR").unwrap_or("./data".into()));

		let senders = parse_senders(&env::var("COLDPOST_SENDERS").unwrap_or_default());
		if senders.is_empty() {
			return Err(Error::ConfigError(
				"COLDPOST_SENDERS must list at least one verified sender address".into(),
			));
		}

		let port = env::var("COLDPOST_SMTP_PORT")
			.ok()
			.and_then(|p| p.parse().ok())
			.unwrap_or(587);
		let timeout_seconds = env::var("COLDPOST_SMTP_TIMEOUT")
			.ok()
			.and_then(|t| t.parse().ok())
			.unwrap_or(30);

		Ok(Self {
			listen: env::var("COLDPOST_LISTEN").unwrap_or("127.0.0.1:8080".into()),
			db_path: data_dir.join("campaigns.db"),
			senders,
			smtp: SmtpConfig {
				host: env::var("COLDPOST_SMTP_HOST").unwrap_or("localhost".into()),
				port,
				username: env::var("COLDPOST_SMTP_USERNAME").unwrap_or_default(),
				password: env::var("COLDPOST_SMTP_PASSWORD").unwrap_or_default(),
				tls_mode: env::var("COLDPOST_SMTP_TLS").unwrap_or("starttls".into()),
				timeout_seconds,
			},
		})
	}
}

/// Parse a `;`-separated sender list. Each entry is either a bare address
/// or `Display Name <address>`; the display name defaults to the address
/// local part. Entries without a usable address are skipped.
pub fn parse_senders(raw: &str) -> Vec<SenderIdentity> {
	raw.split(';')
		.map(str::trim)
		.filter(|entry| !entry.is_empty())
		.filter_map(|entry| {
			let (name, address) = match (entry.find('<'), entry.rfind('>')) {
				(Some(open), Some(close)) if open < close => {
					(entry[..open].trim(), entry[open + 1..close].trim())
				}
				_ => ("", entry),
			};
			if !address.contains('@') {
				warn!("ignoring sender entry without an address: {:?}", entry);
				return None;
			}
			let name = if name.is_empty() {
				address.split('@').next().unwrap_or(address)
			} else {
				name
			};
			Some(SenderIdentity::new(address, name))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_senders_mixed_entries() {
		let senders =
			parse_senders("Acme Sales <sales@acme.com>; support@acme.org ;; not-an-address");
		assert_eq!(senders.len(), 2);
		assert_eq!(senders[0].address.as_ref(), "sales@acme.com");
		assert_eq!(senders[0].display_name.as_ref(), "Acme Sales");
		assert_eq!(senders[0].domain.as_ref(), "acme.com");
		assert_eq!(senders[1].display_name.as_ref(), "support");
	}

	#[test]
	fn test_parse_senders_empty() {
		assert!(parse_senders("").is_empty());
		assert!(parse_senders(" ; ; ").is_empty());
	}
}

// vim: ts=4
