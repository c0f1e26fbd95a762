//! Campaign state store
//!
//! One [`CampaignHub`] holds the state of the currently executing campaign:
//! counters, status, pause reason, the next-delay countdown, and a capped
//! ring buffer of per-email log entries. The driver task mutates it after
//! every email; control handlers mutate it from short-lived requests; UI
//! pollers read snapshots. Writes are plain field assignments under a
//! mutex, and readers must treat snapshots as eventually consistent.
//!
//! Only one campaign may be active at a time: [`CampaignHub::start`]
//! rejects while a run is in progress. Control mutations wake the driver's
//! interruptible sleeps through a [`tokio::sync::Notify`], but take effect
//! only at the driver's next checkpoint.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::prelude::*;
use coldpost_types::lock;
use coldpost_types::store::MAX_EMAIL_LOGS;
use coldpost_types::types::{CampaignStatus, EmailLogEntry, LogStatus, serialize_timestamp_iso};

/// Snapshot of a campaign run, serialized for the status endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignState {
	pub is_running: bool,
	pub status: CampaignStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub campaign_id: Option<Box<str>>,
	pub campaign_name: Box<str>,
	pub sent: u32,
	pub successful: u32,
	pub failed: u32,
	pub total: u32,
	#[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_opt_iso")]
	pub start_time: Option<Timestamp>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pause_reason: Option<Box<str>>,
	/// Seconds until the next email, published while the driver sleeps
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next_email_in: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_delay_ms: Option<u64>,
	/// Monotonic run generation; a driver task only acts on the slot while
	/// its own generation is current (guards against a stale driver touching
	/// a newer run after stop/reset)
	#[serde(skip)]
	pub run_id: u64,
}

fn serialize_opt_iso<S: serde::Serializer>(
	ts: &Option<Timestamp>,
	serializer: S,
) -> Result<S::Ok, S::Error> {
	match ts {
		Some(ts) => serialize_timestamp_iso(ts, serializer),
		None => serializer.serialize_none(),
	}
}

impl Default for CampaignState {
	fn default() -> Self {
		Self {
			is_running: false,
			status: CampaignStatus::Idle,
			campaign_id: None,
			campaign_name: "".into(),
			sent: 0,
			successful: 0,
			failed: 0,
			total: 0,
			start_time: None,
			pause_reason: None,
			next_email_in: None,
			last_delay_ms: None,
			run_id: 0,
		}
	}
}

/// Process-wide slot for the active campaign's state and email log
pub struct CampaignHub {
	state: Mutex<CampaignState>,
	log: Mutex<VecDeque<EmailLogEntry>>,
	notify: Notify,
}

impl CampaignHub {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			state: Mutex::new(CampaignState::default()),
			log: Mutex::new(VecDeque::new()),
			notify: Notify::new(),
		})
	}

	/// Claim the campaign slot, returning the new run generation. Fails
	/// with [`Error::AlreadyRunning`] while another campaign is active.
	pub fn start(&self, name: &str, total: u32, campaign_id: Option<Box<str>>) -> CpResult<u64> {
		let mut state = lock!(self.state)?;
		if state.is_running {
			return Err(Error::AlreadyRunning);
		}
		let run_id = state.run_id + 1;
		*state = CampaignState {
			is_running: true,
			status: CampaignStatus::Running,
			campaign_id,
			campaign_name: name.into(),
			total,
			start_time: Some(Timestamp::now()),
			run_id,
			..CampaignState::default()
		};
		drop(state);
		lock!(self.log)?.clear();
		Ok(run_id)
	}

	/// Attach the persisted document id once the store has created it
	pub fn set_campaign_id(&self, campaign_id: Box<str>) {
		if let Ok(mut state) = lock!(self.state) {
			state.campaign_id = Some(campaign_id);
		}
	}

	/// Read-only copy for pollers and control handlers
	pub fn snapshot(&self) -> CampaignState {
		match lock!(self.state) {
			Ok(state) => state.clone(),
			Err(_) => CampaignState::default(),
		}
	}

	/// Record one send outcome: bumps `sent` plus `successful`/`failed`,
	/// and prepends the log entry, evicting beyond the cap.
	pub fn record_result(&self, entry: EmailLogEntry) {
		if let Ok(mut state) = lock!(self.state) {
			state.sent += 1;
			match entry.status {
				LogStatus::Sent => state.successful += 1,
				LogStatus::Failed => state.failed += 1,
			}
		}
		if let Ok(mut log) = lock!(self.log) {
			log.push_front(entry);
			log.truncate(MAX_EMAIL_LOGS);
		}
	}

	/// Pause the run (control surface or schedule gating)
	pub fn pause(&self, reason: Option<&str>) {
		if let Ok(mut state) = lock!(self.state) {
			if state.is_running {
				state.status = CampaignStatus::Paused;
				state.pause_reason = reason.map(Into::into);
			}
		}
		self.notify.notify_waiters();
	}

	/// Resume a paused run and clear the pause reason
	pub fn resume(&self) {
		if let Ok(mut state) = lock!(self.state) {
			if state.is_running {
				state.status = CampaignStatus::Running;
				state.pause_reason = None;
			}
		}
		self.notify.notify_waiters();
	}

	/// Request the run to stop; the driver exits at its next checkpoint
	pub fn stop(&self) {
		if let Ok(mut state) = lock!(self.state) {
			state.status = CampaignStatus::Stopped;
			state.is_running = false;
		}
		self.notify.notify_waiters();
	}

	/// Terminal transition made by the driver when its loop exits. A run
	/// stopped by the control surface stays `Stopped`; everything else
	/// becomes `Completed`. Returns the final snapshot for persistence, or
	/// `None` when the slot has been superseded (reset or taken by a newer
	/// run) and must not be touched.
	pub fn finish(&self, run_id: u64) -> Option<CampaignState> {
		let mut state = lock!(self.state).ok()?;
		if state.run_id != run_id {
			return None;
		}
		if state.status != CampaignStatus::Stopped {
			state.status = CampaignStatus::Completed;
		}
		state.is_running = false;
		state.next_email_in = None;
		state.pause_reason = None;
		Some(state.clone())
	}

	/// Clear the slot back to idle. Rejected while a campaign is running,
	/// to keep the single-active-campaign invariant intact.
	pub fn reset(&self) -> CpResult<()> {
		let mut state = lock!(self.state)?;
		if state.is_running {
			return Err(Error::AlreadyRunning);
		}
		*state = CampaignState { run_id: state.run_id + 1, ..CampaignState::default() };
		drop(state);
		if let Ok(mut log) = lock!(self.log) {
			log.clear();
		}
		Ok(())
	}

	/// Publish the countdown to the next email for the UI
	pub fn publish_delay(&self, delay_ms: u64) {
		if let Ok(mut state) = lock!(self.state) {
			state.next_email_in = Some((delay_ms / 1000) as u32);
			state.last_delay_ms = Some(delay_ms);
		}
	}

	/// Clear the countdown once the sleep is over
	pub fn clear_countdown(&self) {
		if let Ok(mut state) = lock!(self.state) {
			state.next_email_in = None;
		}
	}

	/// Most recent log entries, newest first
	pub fn recent_log(&self, limit: usize) -> Vec<EmailLogEntry> {
		match lock!(self.log) {
			Ok(log) => log.iter().take(limit).cloned().collect(),
			Err(_) => Vec::new(),
		}
	}

	/// Wait until the next control-state change notification
	pub async fn notified(&self) {
		self.notify.notified().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(recipient: &str, status: LogStatus) -> EmailLogEntry {
		EmailLogEntry {
			recipient: recipient.into(),
			name: None,
			status,
			timestamp: Timestamp::now(),
			error: None,
			sender: "sales@acme.com".into(),
		}
	}

	#[test]
	fn test_start_rejects_second_campaign() {
		let hub = CampaignHub::new();
		hub.start("first", 10, None).unwrap();
		assert!(matches!(hub.start("second", 5, None), Err(Error::AlreadyRunning)));
	}

	#[test]
	fn test_start_after_terminal_state() {
		let hub = CampaignHub::new();
		hub.start("first", 10, None).unwrap();
		hub.stop();
		hub.start("second", 5, None).unwrap();
		let snap = hub.snapshot();
		assert_eq!(snap.campaign_name.as_ref(), "second");
		assert_eq!(snap.sent, 0);
	}

	#[test]
	fn test_record_result_counters() {
		let hub = CampaignHub::new();
		hub.start("run", 3, None).unwrap();
		hub.record_result(entry("a@x.com", LogStatus::Sent));
		hub.record_result(entry("b@x.com", LogStatus::Failed));
		hub.record_result(entry("c@x.com", LogStatus::Sent));

		let snap = hub.snapshot();
		assert_eq!(snap.sent, 3);
		assert_eq!(snap.successful, 2);
		assert_eq!(snap.failed, 1);
	}

	#[test]
	fn test_log_is_capped_and_newest_first() {
		let hub = CampaignHub::new();
		hub.start("run", 300, None).unwrap();
		for i in 0..250 {
			hub.record_result(entry(&format!("user{}@x.com", i), LogStatus::Sent));
		}
		let log = hub.recent_log(MAX_EMAIL_LOGS + 50);
		assert_eq!(log.len(), MAX_EMAIL_LOGS);
		assert_eq!(log[0].recipient.as_ref(), "user249@x.com");
		assert_eq!(log.last().map(|e| e.recipient.as_ref()), Some("user50@x.com"));
	}

	#[test]
	fn test_pause_resume() {
		let hub = CampaignHub::new();
		hub.start("run", 10, None).unwrap();
		hub.pause(Some("Today is Sunday (not in selected days)"));
		let snap = hub.snapshot();
		assert_eq!(snap.status, CampaignStatus::Paused);
		assert!(snap.pause_reason.is_some());
		assert!(snap.is_running);

		hub.resume();
		let snap = hub.snapshot();
		assert_eq!(snap.status, CampaignStatus::Running);
		assert!(snap.pause_reason.is_none());
	}

	#[test]
	fn test_finish_preserves_stopped() {
		let hub = CampaignHub::new();
		let run_id = hub.start("run", 10, None).unwrap();
		hub.stop();
		let final_state = hub.finish(run_id).unwrap();
		assert_eq!(final_state.status, CampaignStatus::Stopped);
		assert!(!final_state.is_running);
	}

	#[test]
	fn test_finish_completes_running() {
		let hub = CampaignHub::new();
		let run_id = hub.start("run", 10, None).unwrap();
		let final_state = hub.finish(run_id).unwrap();
		assert_eq!(final_state.status, CampaignStatus::Completed);
		assert!(!final_state.is_running);
	}

	#[test]
	fn test_finish_ignores_superseded_run() {
		let hub = CampaignHub::new();
		let first_run = hub.start("first", 10, None).unwrap();
		hub.stop();
		hub.reset().unwrap();
		// a stale driver must not touch the reset slot
		assert!(hub.finish(first_run).is_none());
		assert_eq!(hub.snapshot().status, CampaignStatus::Idle);

		let second_run = hub.start("second", 5, None).unwrap();
		assert!(second_run > first_run);
		assert!(hub.finish(first_run).is_none());
		assert_eq!(hub.snapshot().status, CampaignStatus::Running);
	}

	#[test]
	fn test_reset_rejected_while_running() {
		let hub = CampaignHub::new();
		hub.start("run", 10, None).unwrap();
		assert!(hub.reset().is_err());
		hub.stop();
		hub.reset().unwrap();
		assert_eq!(hub.snapshot().status, CampaignStatus::Idle);
	}

	#[test]
	fn test_countdown_roundtrip() {
		let hub = CampaignHub::new();
		hub.start("run", 10, None).unwrap();
		hub.publish_delay(42_000);
		let snap = hub.snapshot();
		assert_eq!(snap.next_email_in, Some(42));
		assert_eq!(snap.last_delay_ms, Some(42_000));
		hub.clear_countdown();
		assert!(hub.snapshot().next_email_in.is_none());
	}
}

// vim: ts=4
