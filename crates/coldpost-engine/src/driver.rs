//! Campaign driver: the cooperative send-orchestration loop
//!
//! One campaign runs as a single long-lived tokio task. Control signals
//! (pause/resume/stop) arrive through the shared [`CampaignHub`] and are
//! observed at fixed checkpoints: before each send, while paused, while
//! schedule-gated, and during pacing sleeps (which wake early on control
//! changes but still only act at the next checkpoint). Emails go out in
//! strict recipient order with senders fixed in advance by the
//! [`AllocationPlan`]; no reordering ever happens.
//!
//! Store writes (log entries, progress snapshots) are best-effort: a
//! persistence failure is logged and the campaign keeps going, with the
//! hub remaining the source of truth for pollers.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::allocation::AllocationPlan;
use crate::content::personalize_content;
use crate::pacing;
use crate::prelude::*;
use crate::schedule::{SCHEDULE_POLL_INTERVAL, TimezoneConfig};
use crate::state::CampaignHub;
use coldpost_types::store::{CampaignProgressPatch, CampaignStore, CreateCampaignOptions};
use coldpost_types::transport::{EmailTransport, OutboundEmail};
use coldpost_types::types::{CampaignStatus, EmailLogEntry, LogStatus, Recipient, SenderIdentity};

/// How often a paused run re-checks for resume/stop
const PAUSE_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Persist progress counters every this many sends (and at completion)
const PROGRESS_PERSIST_EVERY: u32 = 10;

/// Validated input for one campaign run
#[derive(Debug, Clone)]
pub struct CampaignSpec {
	pub name: Box<str>,
	pub subject: Box<str>,
	pub body: Box<str>,
	pub recipients: Vec<Recipient>,
	pub senders: Vec<SenderIdentity>,
	pub timezone: Option<TimezoneConfig>,
}

/// Handle returned by [`CampaignRunner::launch`]
pub struct LaunchedCampaign {
	pub campaign_id: Option<Box<str>>,
	pub total_recipients: u32,
	/// Join handle of the driver task (the control surface ignores it;
	/// tests await it)
	pub handle: JoinHandle<()>,
}

enum Checkpoint {
	Continue,
	Stop,
}

#[derive(Debug, Clone, Copy, Default)]
struct SenderStats {
	sent: u32,
	successful: u32,
	failed: u32,
}

/// Owns the collaborators a campaign run needs and drives the loop
#[derive(Clone)]
pub struct CampaignRunner {
	hub: Arc<CampaignHub>,
	transport: Arc<dyn EmailTransport>,
	store: Arc<dyn CampaignStore>,
}

impl CampaignRunner {
	pub fn new(
		hub: Arc<CampaignHub>,
		transport: Arc<dyn EmailTransport>,
		store: Arc<dyn CampaignStore>,
	) -> Self {
		Self { hub, transport, store }
	}

	pub fn hub(&self) -> &Arc<CampaignHub> {
		&self.hub
	}

	/// Validate the spec, claim the campaign slot, persist the campaign
	/// document (best-effort), and spawn the driver task.
	pub async fn launch(&self, spec: CampaignSpec) -> CpResult<LaunchedCampaign> {
		if spec.name.is_empty() || spec.subject.is_empty() || spec.body.is_empty() {
			return Err(Error::ValidationError(
				"campaign name, subject and body are required".into(),
			));
		}
		if spec.recipients.is_empty() {
			return Err(Error::ValidationError("no valid recipients".into()));
		}
		let plan = AllocationPlan::build(spec.recipients.len(), &spec.senders)?;

		let total = spec.recipients.len() as u32;
		let run_id = self.hub.start(&spec.name, total, None)?;

		let campaign_id = match self
			.store
			.create_campaign(&CreateCampaignOptions {
				name: spec.name.clone(),
				subject: spec.subject.clone(),
				body: spec.body.clone(),
				total_recipients: total,
				selected_senders: spec.senders.iter().map(|s| s.address.clone()).collect(),
			})
			.await
		{
			Ok(id) => {
				self.hub.set_campaign_id(id.clone());
				Some(id)
			}
			Err(err) => {
				// the run proceeds unpersisted; the hub still serves pollers
				warn!("failed to persist campaign document: {}", err);
				None
			}
		};

		info!(
			"starting campaign \"{}\": {} recipients, {} senders",
			spec.name,
			total,
			spec.senders.len()
		);

		let runner = self.clone();
		let task_campaign_id = campaign_id.clone();
		let handle =
			tokio::spawn(async move { runner.run(spec, plan, task_campaign_id, run_id).await });

		Ok(LaunchedCampaign { campaign_id, total_recipients: total, handle })
	}

	/// Run the loop to a terminal state. Whatever happens inside, the hub
	/// never stays `running` after this returns.
	async fn run(
		&self,
		spec: CampaignSpec,
		plan: AllocationPlan,
		campaign_id: Option<Box<str>>,
		run_id: u64,
	) {
		if let Err(err) = self.drive(&spec, &plan, campaign_id.as_deref(), run_id).await {
			error!("campaign loop error: {}", err);
		}

		let Some(final_state) = self.hub.finish(run_id) else {
			warn!("campaign slot superseded before the driver finished");
			return;
		};
		let duration = final_state.start_time.map(|t| t.elapsed_ms() / 1000).unwrap_or_default();
		info!(
			"campaign \"{}\" {}: {}/{} sent, {} failed, {}s",
			final_state.campaign_name,
			final_state.status.as_str(),
			final_state.successful,
			final_state.total,
			final_state.failed,
			duration
		);

		if let Some(id) = campaign_id.as_deref() {
			let patch = CampaignProgressPatch {
				sent_count: Some(final_state.sent),
				success_count: Some(final_state.successful),
				failed_count: Some(final_state.failed),
				status: Some(final_state.status),
				end_time: Some(Timestamp::now()),
			};
			if let Err(err) = self.store.update_progress(id, &patch).await {
				warn!("failed to persist final campaign totals: {}", err);
			}
		}
	}

	async fn drive(
		&self,
		spec: &CampaignSpec,
		plan: &AllocationPlan,
		campaign_id: Option<&str>,
		run_id: u64,
	) -> CpResult<()> {
		let total = spec.recipients.len();
		let start_time = self.hub.snapshot().start_time.unwrap_or_else(Timestamp::now);
		let mut sender_stats = vec![SenderStats::default(); spec.senders.len()];

		'positions: for (position, recipient) in spec.recipients.iter().enumerate() {
			if matches!(self.control_checkpoint(run_id).await, Checkpoint::Stop) {
				info!("campaign stopped at {}/{} emails", position, total);
				break 'positions;
			}

			if let Some(timezone) = &spec.timezone {
				if matches!(self.schedule_gate(timezone, run_id).await, Checkpoint::Stop) {
					info!("campaign stopped while schedule-gated at {}/{}", position, total);
					break 'positions;
				}
			}

			let sender_index = plan.sender_at(position);
			let sender = &spec.senders[sender_index];
			sender_stats[sender_index].sent += 1;

			let subject = personalize_content(
				&spec.subject,
				recipient,
				position,
				&sender.address,
				Some(&sender.display_name),
			);
			let body = personalize_content(
				&spec.body,
				recipient,
				position,
				&sender.address,
				Some(&sender.display_name),
			);

			let email = OutboundEmail {
				from_address: sender.address.clone(),
				from_name: sender.display_name.clone(),
				to_address: recipient.email.clone(),
				to_name: if recipient.name.is_empty() {
					recipient.email.clone()
				} else {
					recipient.name.clone()
				},
				subject: subject.into(),
				text_body: body.into(),
			};

			let entry = match self.transport.send(&email).await {
				Ok(()) => {
					debug!(
						"sent {} via {} ({}/{})",
						recipient.email,
						sender.address,
						position + 1,
						total
					);
					sender_stats[sender_index].successful += 1;
					log_entry(recipient, sender, LogStatus::Sent, None)
				}
				Err(err) => {
					warn!("send failed for {} via {}: {}", recipient.email, sender.address, err);
					sender_stats[sender_index].failed += 1;
					log_entry(recipient, sender, LogStatus::Failed, Some(err.to_string()))
				}
			};
			self.hub.record_result(entry.clone());

			if let Some(id) = campaign_id {
				if let Err(err) = self.store.append_log(id, &entry).await {
					warn!("failed to persist email log: {}", err);
				}

				let snapshot = self.hub.snapshot();
				if snapshot.sent % PROGRESS_PERSIST_EVERY == 0 || snapshot.sent as usize == total {
					let patch = CampaignProgressPatch {
						sent_count: Some(snapshot.sent),
						success_count: Some(snapshot.successful),
						failed_count: Some(snapshot.failed),
						..CampaignProgressPatch::default()
					};
					if let Err(err) = self.store.update_progress(id, &patch).await {
						warn!("failed to persist campaign progress: {}", err);
					}
				}
			}

			if position + 1 < total {
				let sent = self.hub.snapshot().sent;
				let delay_ms = pacing::compute_delay(
					position,
					sent,
					total,
					&sender.address,
					start_time,
					spec.timezone.as_ref(),
				);
				self.hub.publish_delay(delay_ms);
				debug!("waiting {}s before next email", delay_ms / 1000);
				self.interruptible_sleep(Duration::from_millis(delay_ms), run_id).await;
				self.hub.clear_countdown();
			}
		}

		for (index, sender) in spec.senders.iter().enumerate() {
			let stats = &sender_stats[index];
			debug!(
				"sender {}: {} assigned, {} sent, {} ok, {} failed",
				sender.address,
				plan.senders[index].target_count,
				stats.sent,
				stats.successful,
				stats.failed
			);
		}

		Ok(())
	}

	/// Checkpoint before each send: wait out pauses, detect stop or a
	/// superseded run
	async fn control_checkpoint(&self, run_id: u64) -> Checkpoint {
		loop {
			let snapshot = self.hub.snapshot();
			if snapshot.run_id != run_id {
				return Checkpoint::Stop;
			}
			match snapshot.status {
				CampaignStatus::Stopped => return Checkpoint::Stop,
				CampaignStatus::Paused => {
					tokio::select! {
						() = tokio::time::sleep(PAUSE_POLL_INTERVAL) => {},
						() = self.hub.notified() => {},
					}
				}
				CampaignStatus::Running if snapshot.is_running => return Checkpoint::Continue,
				_ => return Checkpoint::Stop,
			}
		}
	}

	/// Block while outside the configured sending window, re-checking every
	/// [`SCHEDULE_POLL_INTERVAL`]. Publishes the pause reason while gated.
	async fn schedule_gate(&self, timezone: &TimezoneConfig, run_id: u64) -> Checkpoint {
		let mut was_gated = false;
		loop {
			let snapshot = self.hub.snapshot();
			if snapshot.run_id != run_id || snapshot.status == CampaignStatus::Stopped {
				return Checkpoint::Stop;
			}

			let now = chrono::Utc::now();
			if timezone.permits(now) {
				if was_gated {
					info!("schedule window open, resuming campaign");
					self.hub.resume();
				}
				return Checkpoint::Continue;
			}

			let reason = timezone.pause_reason(now);
			if !was_gated {
				info!("campaign paused by schedule: {}", reason);
				was_gated = true;
			}
			self.hub.pause(Some(&reason));

			tokio::select! {
				() = tokio::time::sleep(SCHEDULE_POLL_INTERVAL) => {},
				() = self.hub.notified() => {},
			}
		}
	}

	/// Sleep that wakes early on control changes; spurious notifications
	/// resume sleeping until the deadline.
	async fn interruptible_sleep(&self, duration: Duration, run_id: u64) {
		let deadline = tokio::time::Instant::now() + duration;
		loop {
			if tokio::time::Instant::now() >= deadline {
				return;
			}
			tokio::select! {
				() = tokio::time::sleep_until(deadline) => return,
				() = self.hub.notified() => {
					let snapshot = self.hub.snapshot();
					if snapshot.run_id != run_id
						|| snapshot.status != CampaignStatus::Running
						|| !snapshot.is_running
					{
						return;
					}
				}
			}
		}
	}
}

fn log_entry(
	recipient: &Recipient,
	sender: &SenderIdentity,
	status: LogStatus,
	error: Option<String>,
) -> EmailLogEntry {
	EmailLogEntry {
		recipient: recipient.email.clone(),
		name: (!recipient.name.is_empty()).then(|| recipient.name.clone()),
		status,
		timestamp: Timestamp::now(),
		error: error.map(Into::into),
		sender: sender.address.clone(),
	}
}

// vim: ts=4
