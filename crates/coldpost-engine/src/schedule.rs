//! Schedule policy: timezone-aware day and hour gating
//!
//! A campaign may restrict sending to selected weekdays and an hour window,
//! both evaluated in a target IANA timezone. The driver gates on
//! [`TimezoneConfig::permits`] and re-checks every [`SCHEDULE_POLL_INTERVAL`]
//! while blocked.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often the driver re-checks the schedule while gated
pub const SCHEDULE_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Weekday mask; `true` means sending is allowed on that day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendDays {
	pub sunday: bool,
	pub monday: bool,
	pub tuesday: bool,
	pub wednesday: bool,
	pub thursday: bool,
	pub friday: bool,
	pub saturday: bool,
}

impl SendDays {
	pub const fn all() -> Self {
		Self {
			sunday: true,
			monday: true,
			tuesday: true,
			wednesday: true,
			thursday: true,
			friday: true,
			saturday: true,
		}
	}

	pub const fn weekdays() -> Self {
		Self {
			sunday: false,
			monday: true,
			tuesday: true,
			wednesday: true,
			thursday: true,
			friday: true,
			saturday: false,
		}
	}

	pub const fn none() -> Self {
		Self {
			sunday: false,
			monday: false,
			tuesday: false,
			wednesday: false,
			thursday: false,
			friday: false,
			saturday: false,
		}
	}

	pub fn allows(&self, day: Weekday) -> bool {
		match day {
			Weekday::Sun => self.sunday,
			Weekday::Mon => self.monday,
			Weekday::Tue => self.tuesday,
			Weekday::Wed => self.wednesday,
			Weekday::Thu => self.thursday,
			Weekday::Fri => self.friday,
			Weekday::Sat => self.saturday,
		}
	}
}

/// Per-campaign sending window configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneConfig {
	pub target_timezone: Tz,
	/// Hour (0-23), inclusive start of the sending window
	pub send_time_start: u8,
	/// Hour (0-23), exclusive end of the sending window
	pub send_time_end: u8,
	pub send_days: SendDays,
}

impl TimezoneConfig {
	/// Current wall-clock time in the target timezone
	pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<Tz> {
		now.with_timezone(&self.target_timezone)
	}

	/// Is the target timezone's local day enabled in the day mask?
	pub fn is_sending_allowed_today(&self, now: DateTime<Utc>) -> bool {
		self.send_days.allows(self.local_time(now).weekday())
	}

	/// Is the target timezone's local hour inside `[start, end)`?
	pub fn is_within_sending_window(&self, now: DateTime<Utc>) -> bool {
		let hour = self.local_time(now).hour();
		hour >= u32::from(self.send_time_start) && hour < u32::from(self.send_time_end)
	}

	/// Sending is permitted iff both the day and the hour checks pass
	pub fn permits(&self, now: DateTime<Utc>) -> bool {
		self.is_sending_allowed_today(now) && self.is_within_sending_window(now)
	}

	/// Human-readable reason why sending is currently gated
	pub fn pause_reason(&self, now: DateTime<Utc>) -> String {
		let local = self.local_time(now);
		if !self.is_sending_allowed_today(now) {
			format!("Today is {} (not in selected days)", day_name(local.weekday()))
		} else {
			format!(
				"Current time is {}:00 (outside {}:00-{}:00 {})",
				local.hour(),
				self.send_time_start,
				self.send_time_end,
				self.target_timezone
			)
		}
	}

	/// Pacing multiplier derived from the schedule: fast inside the window,
	/// very slow outside it or on disabled days.
	pub fn delay_multiplier(&self, now: DateTime<Utc>) -> f64 {
		if !self.is_sending_allowed_today(now) {
			10.0
		} else if self.is_within_sending_window(now) {
			0.7
		} else {
			5.0
		}
	}
}

fn day_name(day: Weekday) -> &'static str {
	match day {
		Weekday::Sun => "Sunday",
		Weekday::Mon => "Monday",
		Weekday::Tue => "Tuesday",
		Weekday::Wed => "Wednesday",
		Weekday::Thu => "Thursday",
		Weekday::Fri => "Friday",
		Weekday::Sat => "Saturday",
	}
}

/// Common sending-window presets
pub mod presets {
	use super::{SendDays, TimezoneConfig};

	pub fn sydney() -> TimezoneConfig {
		TimezoneConfig {
			target_timezone: chrono_tz::Australia::Sydney,
			send_time_start: 9,
			send_time_end: 17,
			send_days: SendDays::weekdays(),
		}
	}

	pub fn new_york() -> TimezoneConfig {
		TimezoneConfig {
			target_timezone: chrono_tz::America::New_York,
			send_time_start: 9,
			send_time_end: 17,
			send_days: SendDays::weekdays(),
		}
	}

	pub fn london() -> TimezoneConfig {
		TimezoneConfig {
			target_timezone: chrono_tz::Europe::London,
			send_time_start: 9,
			send_time_end: 17,
			send_days: SendDays::weekdays(),
		}
	}

	/// Fri/Sat weekend
	pub fn dubai() -> TimezoneConfig {
		TimezoneConfig {
			target_timezone: chrono_tz::Asia::Dubai,
			send_time_start: 8,
			send_time_end: 17,
			send_days: SendDays {
				friday: false,
				saturday: false,
				sunday: true,
				..SendDays::all()
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn utc_config(days: SendDays, start: u8, end: u8) -> TimezoneConfig {
		TimezoneConfig {
			target_timezone: chrono_tz::UTC,
			send_time_start: start,
			send_time_end: end,
			send_days: days,
		}
	}

	// 2025-06-02 is a Monday
	fn monday(hour: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 6, 2, hour, 30, 0).single().unwrap()
	}

	#[test]
	fn test_window_bounds() {
		let config = utc_config(SendDays::all(), 9, 17);
		assert!(!config.is_within_sending_window(monday(8)));
		assert!(config.is_within_sending_window(monday(9)));
		assert!(config.is_within_sending_window(monday(16)));
		// end hour is exclusive
		assert!(!config.is_within_sending_window(monday(17)));
	}

	#[test]
	fn test_day_mask() {
		let config = utc_config(SendDays::weekdays(), 0, 24);
		assert!(config.is_sending_allowed_today(monday(12)));
		// 2025-06-01 is a Sunday
		let sunday = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap();
		assert!(!config.is_sending_allowed_today(sunday));
	}

	#[test]
	fn test_permits_requires_both() {
		let config = utc_config(SendDays::weekdays(), 9, 17);
		assert!(config.permits(monday(10)));
		assert!(!config.permits(monday(20)));
		assert!(!utc_config(SendDays::none(), 9, 17).permits(monday(10)));
	}

	#[test]
	fn test_timezone_conversion() {
		// 2025-06-02 23:00 UTC is 2025-06-03 09:00 in Sydney (AEST, +10)
		let config = presets::sydney();
		let now = Utc.with_ymd_and_hms(2025, 6, 2, 23, 0, 0).single().unwrap();
		assert_eq!(config.local_time(now).hour(), 9);
		assert!(config.permits(now));
	}

	#[test]
	fn test_pause_reason_mentions_day_or_hour() {
		let config = utc_config(SendDays::none(), 9, 17);
		assert!(config.pause_reason(monday(10)).contains("Monday"));
		let config = utc_config(SendDays::all(), 9, 17);
		assert!(config.pause_reason(monday(20)).contains("outside 9:00-17:00"));
	}

	#[test]
	fn test_delay_multiplier() {
		let config = utc_config(SendDays::all(), 9, 17);
		assert!((config.delay_multiplier(monday(10)) - 0.7).abs() < f64::EPSILON);
		assert!((config.delay_multiplier(monday(20)) - 5.0).abs() < f64::EPSILON);
		let closed = utc_config(SendDays::none(), 9, 17);
		assert!((closed.delay_multiplier(monday(10)) - 10.0).abs() < f64::EPSILON);
	}

	#[test]
	fn test_dubai_weekend() {
		let config = presets::dubai();
		assert!(!config.send_days.friday);
		assert!(config.send_days.sunday);
	}

	#[test]
	fn test_config_json_roundtrip() {
		let config = presets::new_york();
		let json = serde_json::to_string(&config).unwrap();
		assert!(json.contains("America/New_York"));
		let back: TimezoneConfig = serde_json::from_str(&json).unwrap();
		assert_eq!(back, config);
	}
}

// vim: ts=4
