//! Recipient intake: parsing, validation, and de-duplication
//!
//! Recipient lists arrive as pasted text (one address per line, optionally
//! `name,email` CSV lines) or as pre-built JSON arrays. Either way they are
//! normalized here before the driver sees them: lowercased unique emails,
//! names defaulting to the address local part, invalid addresses dropped.

use coldpost_types::types::Recipient;

/// Loose structural email check: one `@`, no whitespace, dotted domain
pub fn is_valid_email(email: &str) -> bool {
	let email = email.trim();
	let mut parts = email.split('@');
	let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
		return false;
	};
	!local.is_empty()
		&& !domain.is_empty()
		&& domain.contains('.')
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
		&& !email.contains(char::is_whitespace)
}

/// Parse pasted recipient text: plain email lines and `name,email` /
/// `email,name` CSV lines. Invalid lines are skipped; the result is deduped.
pub fn parse_recipients(text: &str) -> Vec<Recipient> {
	let mut recipients = Vec::new();

	for line in text.lines() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		if line.contains('@') && !line.contains(',') {
			let local = line.split('@').next().unwrap_or(line);
			recipients.push(Recipient::new(line, local));
			continue;
		}

		let parts: Vec<&str> = line.split(',').map(str::trim).collect();
		if parts.len() >= 2 {
			let email = parts.iter().find(|p| p.contains('@'));
			let name = parts.iter().find(|p| !p.contains('@'));
			if let Some(&email) = email {
				let fallback = email.split('@').next().unwrap_or(email);
				recipients.push(Recipient::new(email, name.copied().unwrap_or(fallback)));
			}
		}
	}

	dedupe_recipients(recipients)
}

/// Case-insensitive dedup on email; first occurrence wins. Empty names
/// fall back to the address local part.
pub fn dedupe_recipients(recipients: Vec<Recipient>) -> Vec<Recipient> {
	let mut seen = std::collections::HashSet::new();
	let mut result = Vec::with_capacity(recipients.len());

	for recipient in recipients {
		let email = recipient.email.trim().to_lowercase();
		if email.is_empty() || !seen.insert(email.clone()) {
			continue;
		}
		let name = recipient.name.trim();
		let name = if name.is_empty() {
			email.split('@').next().unwrap_or(&email).to_string()
		} else {
			name.to_string()
		};
		result.push(Recipient::new(email, name));
	}

	result
}

/// Normalize an externally supplied recipient list: trim, validate the
/// email format, and dedup
pub fn sanitize_recipients(input: Vec<Recipient>) -> Vec<Recipient> {
	let valid = input
		.into_iter()
		.filter(|r| is_valid_email(&r.email))
		.map(|r| Recipient::new(r.email.trim(), r.name.trim()))
		.collect();
	dedupe_recipients(valid)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_valid_emails() {
		assert!(is_valid_email("user@example.com"));
		assert!(is_valid_email("  first.last@sub.domain.org "));
		assert!(!is_valid_email("userexample.com"));
		assert!(!is_valid_email("user@nodot"));
		assert!(!is_valid_email("user@@example.com"));
		assert!(!is_valid_email("us er@example.com"));
		assert!(!is_valid_email("@example.com"));
	}

	#[test]
	fn test_parse_plain_and_csv_lines() {
		let text = "alice@x.com\nBob Smith,bob@y.org\ncarol@z.net,Carol\n\nnot-an-email\n";
		let recipients = parse_recipients(text);
		assert_eq!(recipients.len(), 3);
		assert_eq!(recipients[0], Recipient::new("alice@x.com", "alice"));
		assert_eq!(recipients[1], Recipient::new("bob@y.org", "Bob Smith"));
		assert_eq!(recipients[2], Recipient::new("carol@z.net", "Carol"));
	}

	#[test]
	fn test_dedupe_is_case_insensitive() {
		let input = vec![
			Recipient::new("User@X.com", "User"),
			Recipient::new("user@x.com", "Duplicate"),
			Recipient::new("other@x.com", ""),
		];
		let deduped = dedupe_recipients(input);
		assert_eq!(deduped.len(), 2);
		assert_eq!(deduped[0], Recipient::new("user@x.com", "User"));
		assert_eq!(deduped[1], Recipient::new("other@x.com", "other"));
	}

	#[test]
	fn test_sanitize_drops_invalid() {
		let input = vec![
			Recipient::new("good@x.com", "Good"),
			Recipient::new("bad-address", "Bad"),
			Recipient::new("GOOD@x.com", "Dup"),
		];
		let sanitized = sanitize_recipients(input);
		assert_eq!(sanitized.len(), 1);
		assert_eq!(sanitized[0].email.as_ref(), "good@x.com");
	}
}

// vim: ts=4
