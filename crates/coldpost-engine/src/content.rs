//! Content engine: spintax expansion and personalization variables
//!
//! Spintax blocks (`{option1|option2|...}`) are expanded one at a time,
//! left to right. Double-brace placeholders (`{{name}}`, `{{email}}`, ...)
//! carry no pipe and are never treated as spintax; they are substituted
//! after expansion with recipient- and sender-derived values.
//!
//! Expansion is deterministic when a seed is supplied: the same seed and
//! text always produce the same output, which gives every recipient a
//! stable variant across subject and body.

use rand::RngExt;

use coldpost_types::types::Recipient;

/// Upper bound on expansion passes, so adversarial input cannot loop forever
const SPINTAX_MAX_ITERATIONS: usize = 100;

/// Minimal linear-congruential generator for seeded expansion
struct SeededRng {
	state: u64,
}

impl SeededRng {
	fn new(seed: u32) -> Self {
		Self { state: u64::from(seed) }
	}

	/// Next value in `[0, 1)`
	fn next_f64(&mut self) -> f64 {
		self.state = (self.state.wrapping_mul(9301).wrapping_add(49297)) % 233_280;
		self.state as f64 / 233_280.0
	}
}

enum Chooser {
	Seeded(SeededRng),
	Thread(rand::rngs::ThreadRng),
}

impl Chooser {
	fn new(seed: Option<u32>) -> Self {
		match seed {
			Some(seed) => Chooser::Seeded(SeededRng::new(seed)),
			None => Chooser::Thread(rand::rng()),
		}
	}

	fn pick(&mut self, options: usize) -> usize {
		match self {
			Chooser::Seeded(rng) => {
				let index = (rng.next_f64() * options as f64) as usize;
				index.min(options - 1)
			}
			Chooser::Thread(rng) => rng.random_range(0..options),
		}
	}
}

/// A segment qualifies as spintax when it holds at least one pipe with
/// content on both sides (`a|b`, `a||b`), mirroring the grammar
/// "open-brace, segment containing a pipe, close-brace, no nesting".
fn is_spintax_segment(segment: &str) -> bool {
	segment.contains('|') && !segment.starts_with('|') && !segment.ends_with('|')
}

/// Find the first spintax block, returning byte offsets of its braces
fn find_spintax(text: &str) -> Option<(usize, usize)> {
	let mut open: Option<usize> = None;
	for (i, b) in text.bytes().enumerate() {
		match b {
			b'{' => open = Some(i),
			b'}' => {
				if let Some(start) = open.take() {
					if is_spintax_segment(&text[start + 1..i]) {
						return Some((start, i));
					}
				}
			}
			_ => {}
		}
	}
	None
}

/// Expand every spintax block in `text`, choosing one trimmed option per
/// block. With a seed the choice sequence is deterministic; without one it
/// uses the thread RNG.
pub fn expand_spintax(text: &str, seed: Option<u32>) -> String {
	let mut chooser = Chooser::new(seed);
	let mut result = text.to_string();

	let mut iterations = 0;
	while iterations < SPINTAX_MAX_ITERATIONS {
		let Some((start, end)) = find_spintax(&result) else { break };
		let chosen = {
			let options: Vec<&str> = result[start + 1..end].split('|').map(str::trim).collect();
			let index = chooser.pick(options.len());
			options.get(index).copied().unwrap_or_default().to_string()
		};
		result.replace_range(start..=end, &chosen);
		iterations += 1;
	}

	result
}

/// Stable 32-bit string hash used for seeding
pub fn string_hash(s: &str) -> u32 {
	let mut hash: i32 = 0;
	for c in s.chars() {
		hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(c as i32);
	}
	hash.unsigned_abs()
}

/// Display-name fallback for well-known sender usernames
fn fallback_sender_name(sender_address: &str) -> &'static str {
	match sender_address.split('@').next().unwrap_or_default() {
		"sales" => "John from Sales",
		"support" => "Sarah from Support",
		"marketing" => "Mike from Marketing",
		"hello" => "Customer Success",
		"contact" => "Business Development",
		_ => "The Team",
	}
}

/// Personalize `content` for one recipient: expand spintax with a seed
/// derived from the recipient and content, then substitute the variable
/// placeholders. Pure for a given `(content, recipient, index)` triple.
pub fn personalize_content(
	content: &str,
	recipient: &Recipient,
	recipient_index: usize,
	sender_address: &str,
	sender_display_name: Option<&str>,
) -> String {
	if content.is_empty() {
		return String::new();
	}

	// Seed from recipient identity, position, and a prefix of the content,
	// so subject and body get independent but reproducible variants.
	let prefix: String = content.chars().take(100).collect();
	let unique = format!(
		"{}_{}_{}_{}",
		recipient.email,
		recipient_index,
		recipient.domain(),
		string_hash(&prefix)
	);
	let personalized = expand_spintax(content, Some(string_hash(&unique)));

	let sender_name = match sender_display_name {
		Some(name) if !name.is_empty() => name,
		_ => fallback_sender_name(sender_address),
	};

	let display_name =
		if recipient.name.is_empty() { recipient.local_part() } else { &recipient.name };
	let first_name = display_name.split_whitespace().next().unwrap_or(display_name);
	let last_name = display_name.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");

	personalized
		.replace("{{name}}", display_name)
		.replace("{{email}}", &recipient.email)
		.replace("{{firstName}}", first_name)
		.replace("{{lastName}}", &last_name)
		.replace("{{senderName}}", sender_name)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_expand_picks_an_option() {
		let out = expand_spintax("{hello|hi} world", Some(7));
		assert!(out == "hello world" || out == "hi world");
	}

	#[test]
	fn test_expand_is_deterministic_per_seed() {
		let text = "{a|b} {c|d} {e|f|g}";
		assert_eq!(expand_spintax(text, Some(42)), expand_spintax(text, Some(42)));
		assert_eq!(expand_spintax(text, Some(9999)), expand_spintax(text, Some(9999)));
	}

	#[test]
	fn test_expand_covers_both_options_over_seeds() {
		let mut saw_a = false;
		let mut saw_b = false;
		for seed in 0..200 {
			match expand_spintax("{a|b}", Some(seed)).as_str() {
				"a" => saw_a = true,
				"b" => saw_b = true,
				other => panic!("unexpected expansion: {}", other),
			}
		}
		assert!(saw_a && saw_b);
	}

	#[test]
	fn test_expand_trims_options() {
		let out = expand_spintax("{ hello | hello }", Some(1));
		assert_eq!(out, "hello");
	}

	#[test]
	fn test_variables_are_not_spintax() {
		let text = "Hi {{name}}, your address is {{email}}";
		assert_eq!(expand_spintax(text, Some(3)), text);
	}

	#[test]
	fn test_expand_handles_nested_like_input() {
		// Only the inner brace-free segment is a block
		let out = expand_spintax("{x {a|b}}", Some(5));
		assert!(out == "{x a}" || out == "{x b}");
	}

	#[test]
	fn test_expand_iteration_cap() {
		let text = "{a|b}".repeat(150);
		let out = expand_spintax(&text, Some(11));
		// 100 blocks expanded, 50 left untouched
		assert_eq!(out.matches('{').count(), 50);
	}

	#[test]
	fn test_personalize_substitutes_variables() {
		let recipient = Recipient::new("john.doe@x.com", "John Doe");
		let content = "Hi {{firstName}} {{lastName}}, {{name}} <{{email}}>";
		let out = personalize_content(content, &recipient, 0, "sales@acme.com", None);
		assert_eq!(out, "Hi John Doe, John Doe <john.doe@x.com>");
	}

	#[test]
	fn test_personalize_is_pure() {
		let recipient = Recipient::new("jane@y.org", "Jane");
		let content = "{Hey|Hello|Hi} {{firstName}}, {quick|short} question";
		let a = personalize_content(content, &recipient, 3, "sales@acme.com", None);
		let b = personalize_content(content, &recipient, 3, "sales@acme.com", None);
		assert_eq!(a, b);
	}

	#[test]
	fn test_personalize_sender_name_fallbacks() {
		let recipient = Recipient::new("a@b.com", "A");
		let explicit =
			personalize_content("{{senderName}}", &recipient, 0, "sales@acme.com", Some("Maria"));
		assert_eq!(explicit, "Maria");
		let mapped = personalize_content("{{senderName}}", &recipient, 0, "sales@acme.com", None);
		assert_eq!(mapped, "John from Sales");
		let unknown = personalize_content("{{senderName}}", &recipient, 0, "noreply@acme.com", None);
		assert_eq!(unknown, "The Team");
	}

	#[test]
	fn test_personalize_name_falls_back_to_local_part() {
		let recipient = Recipient::new("sam@z.io", "");
		let out = personalize_content("{{name}}/{{firstName}}/{{lastName}}", &recipient, 0, "", None);
		assert_eq!(out, "sam/sam/");
	}

	#[test]
	fn test_string_hash_is_stable() {
		assert_eq!(string_hash("hello"), string_hash("hello"));
		assert_ne!(string_hash("hello"), string_hash("hellp"));
	}
}

// vim: ts=4
