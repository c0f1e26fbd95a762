//! Pacing model: human-like delays between sends
//!
//! [`compute_delay`] combines several heuristics to avoid machine-regular
//! intervals: a quick burst phase at campaign start, occasional multi-minute
//! breaks, a workday rhythm, progressive slowdown, a stable per-sender
//! tempo, an anti-repetition breaker, and random spikes. The result is
//! always clamped to `[min_delay, MAX_DELAY_MS]`.
//!
//! This is a heuristic, not a contract; only the bounds and the phase
//! triggers are load-bearing.

use rand::RngExt;

use crate::content::string_hash;
use crate::schedule::TimezoneConfig;
use coldpost_types::types::Timestamp;

/// Hard upper bound on any computed delay (20 minutes)
pub const MAX_DELAY_MS: u64 = 1_200_000;

/// Stable per-sender tempo multiplier in `[0.8, 1.2]`, derived from the
/// sender address so each sender keeps its own cadence across a campaign.
pub fn sender_variation(sender_address: &str) -> f64 {
	0.8 + f64::from(string_hash(sender_address) % 100) / 100.0 * 0.4
}

/// Compute the delay in milliseconds to wait after sending the email at
/// `recipient_index`. `total_sent` is the overall number of emails already
/// sent (it relaxes the minimum bound for the first ten sends).
pub fn compute_delay(
	recipient_index: usize,
	total_sent: u32,
	total: usize,
	sender_address: &str,
	campaign_start: Timestamp,
	timezone: Option<&TimezoneConfig>,
) -> u64 {
	let mut rng = rand::rng();
	let raw = raw_delay(&mut rng, recipient_index, total, sender_address, campaign_start, timezone);

	let min_delay = if total_sent < 10 { 8_000.0 } else { 15_000.0 };
	raw.clamp(min_delay, MAX_DELAY_MS as f64) as u64
}

fn raw_delay(
	rng: &mut rand::rngs::ThreadRng,
	recipient_index: usize,
	total: usize,
	sender_address: &str,
	campaign_start: Timestamp,
	timezone: Option<&TimezoneConfig>,
) -> f64 {
	let elapsed_ms = campaign_start.elapsed_ms() as f64;
	let progress = recipient_index as f64 / total.max(1) as f64;

	// Burst phase: the first few sends go out quickly
	if (recipient_index as f64) < (total as f64 * 0.1).min(20.0) {
		let burst: f64 = 15_000.0 + rng.random_range(0.0..1.0) * 25_000.0;
		let jitter = (rng.random_range(0.0..1.0) - 0.5) * 10_000.0;
		return (burst + jitter).max(5_000.0);
	}

	// Strategic breaks: every 50th email, occasionally after the 100th,
	// and every 25th once half an hour has passed
	let should_pause = recipient_index % 50 == 0
		|| (recipient_index > 100 && rng.random_range(0.0..1.0) < 0.05)
		|| (elapsed_ms > 1_800_000.0 && recipient_index % 25 == 0);
	if should_pause {
		let kind = rng.random_range(0.0..1.0);
		return if kind < 0.3 {
			// short break: 2-5 minutes
			120_000.0 + rng.random_range(0.0..1.0) * 180_000.0
		} else if kind < 0.6 {
			// medium break: 5-10 minutes
			300_000.0 + rng.random_range(0.0..1.0) * 300_000.0
		} else {
			// long break: 10-20 minutes
			600_000.0 + rng.random_range(0.0..1.0) * 600_000.0
		};
	}

	// Workday rhythm: follow the configured window when present, else a
	// synthesized 24h cycle over elapsed campaign time
	let workday_multiplier = match timezone {
		Some(tz) => tz.delay_multiplier(chrono::Utc::now()),
		None => {
			let simulated_hour = (elapsed_ms / 3_600_000.0) % 24.0;
			if (9.0..=17.0).contains(&simulated_hour) {
				0.7
			} else if (18.0..=22.0).contains(&simulated_hour) {
				1.0
			} else {
				1.5
			}
		}
	};

	// Progressive slowdown, up to 80% by campaign end
	let fatigue_multiplier = 1.0 + progress * 0.8;

	let base_delay = if progress < 0.3 {
		30_000.0 + rng.random_range(0.0..1.0) * 45_000.0
	} else if progress < 0.7 {
		45_000.0 + rng.random_range(0.0..1.0) * 30_000.0
	} else {
		60_000.0 + rng.random_range(0.0..1.0) * 60_000.0
	};

	// Break up repeating intervals on a 7-email cycle
	let pattern_breaker = match recipient_index % 7 {
		0 => 1.5,
		3 => 0.6,
		_ => 1.0,
	};

	// Occasional spikes: rare very long waits, some long, some short bursts
	let spike_roll = rng.random_range(0.0..1.0);
	let spike_multiplier = if spike_roll < 0.02 {
		6.0 + rng.random_range(0.0..1.0) * 14.0
	} else if spike_roll < 0.08 {
		2.5 + rng.random_range(0.0..1.0) * 4.0
	} else if spike_roll < 0.15 {
		0.3 + rng.random_range(0.0..1.0) * 0.4
	} else {
		1.0
	};

	let final_delay = base_delay
		* workday_multiplier
		* fatigue_multiplier
		* sender_variation(sender_address)
		* pattern_breaker
		* spike_multiplier;

	// ±10% jitter against micro-patterns
	let jitter = (rng.random_range(0.0..1.0) - 0.5) * final_delay * 0.2;
	final_delay + jitter
}

#[cfg(test)]
mod tests {
	use super::*;

	fn start_now() -> Timestamp {
		Timestamp::now()
	}

	#[test]
	fn test_burst_phase_bounds() {
		for index in 0..20 {
			let delay = compute_delay(index, index as u32, 200, "sales@acme.com", start_now(), None);
			assert!(delay >= 5_000, "burst delay {} too small at index {}", delay, index);
			assert!(delay <= 46_000, "burst delay {} too large at index {}", delay, index);
		}
	}

	#[test]
	fn test_global_bounds() {
		for index in 0..300 {
			let delay =
				compute_delay(index, index as u32, 1000, "random@sender.io", start_now(), None);
			let min = if index < 10 { 8_000 } else { 15_000 };
			assert!(delay >= min, "delay {} below minimum at index {}", delay, index);
			assert!(delay <= MAX_DELAY_MS, "delay {} above maximum at index {}", delay, index);
		}
	}

	#[test]
	fn test_scheduled_pause_every_50th() {
		for _ in 0..10 {
			let delay = compute_delay(50, 50, 1000, "sales@acme.com", start_now(), None);
			assert!(delay >= 120_000, "expected a break at index 50, got {}", delay);
			assert!(delay <= MAX_DELAY_MS);
		}
	}

	#[test]
	fn test_sender_variation_is_stable_and_bounded() {
		let a = sender_variation("sales@acme.com");
		assert!((0.8..=1.2).contains(&a));
		assert!((a - sender_variation("sales@acme.com")).abs() < f64::EPSILON);
		// different senders generally land on different tempos
		let b = sender_variation("support@other.net");
		assert!((0.8..=1.2).contains(&b));
	}

	#[test]
	fn test_small_campaign_has_tiny_burst_phase() {
		// total=5 gives a burst threshold of 0.5, so only index 0 bursts
		let delay = compute_delay(1, 1, 5, "sales@acme.com", start_now(), None);
		assert!(delay >= 8_000);
		assert!(delay <= MAX_DELAY_MS);
	}
}

// vim: ts=4
