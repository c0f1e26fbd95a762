//! In-memory adapter implementations for tests
//!
//! [`MockTransport`] records every attempted send and can fail selected
//! positions or invoke a hook (e.g. to issue control signals mid-campaign).
//! [`MemoryStore`] is a functional in-memory [`CampaignStore`];
//! [`FailingStore`] errors on every call to exercise the best-effort
//! persistence paths.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::prelude::*;
use coldpost_types::lock;
use coldpost_types::store::{
	CampaignProgressPatch, CampaignRecord, CampaignStore, CreateCampaignOptions,
	ListCampaignOptions, MAX_EMAIL_LOGS,
};
use coldpost_types::transport::{EmailTransport, OutboundEmail};
use coldpost_types::types::{CampaignStatus, EmailLogEntry};
use coldpost_types::utils::random_id;

type SendHook = Box<dyn Fn(usize, &OutboundEmail) + Send + Sync>;

/// Transport double recording every attempted send
pub struct MockTransport {
	attempts: Mutex<Vec<OutboundEmail>>,
	fail_on: Vec<usize>,
	hook: Option<SendHook>,
}

impl MockTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self { attempts: Mutex::new(Vec::new()), fail_on: Vec::new(), hook: None })
	}

	/// Fail the sends at the given 0-based attempt positions
	pub fn failing_on(positions: &[usize]) -> Arc<Self> {
		Arc::new(Self {
			attempts: Mutex::new(Vec::new()),
			fail_on: positions.to_vec(),
			hook: None,
		})
	}

	/// Invoke `hook(attempt_index, email)` on every send, before returning
	pub fn with_hook(hook: impl Fn(usize, &OutboundEmail) + Send + Sync + 'static) -> Arc<Self> {
		Arc::new(Self {
			attempts: Mutex::new(Vec::new()),
			fail_on: Vec::new(),
			hook: Some(Box::new(hook)),
		})
	}

	/// Every attempted send so far, in order
	pub fn attempts(&self) -> Vec<OutboundEmail> {
		lock!(self.attempts).map(|a| a.clone()).unwrap_or_default()
	}

	pub fn attempt_count(&self) -> usize {
		lock!(self.attempts).map(|a| a.len()).unwrap_or_default()
	}
}

#[async_trait]
impl EmailTransport for MockTransport {
	async fn send(&self, email: &OutboundEmail) -> CpResult<()> {
		let index = {
			let mut attempts = lock!(self.attempts)?;
			attempts.push(email.clone());
			attempts.len() - 1
		};
		if let Some(hook) = &self.hook {
			hook(index, email);
		}
		if self.fail_on.contains(&index) {
			return Err(Error::ServiceUnavailable("simulated transport failure".into()));
		}
		Ok(())
	}
}

/// Functional in-memory campaign store
pub struct MemoryStore {
	campaigns: Mutex<Vec<CampaignRecord>>,
}

impl MemoryStore {
	pub fn new() -> Arc<Self> {
		Arc::new(Self { campaigns: Mutex::new(Vec::new()) })
	}

	pub fn campaigns(&self) -> Vec<CampaignRecord> {
		lock!(self.campaigns).map(|c| c.clone()).unwrap_or_default()
	}
}

#[async_trait]
impl CampaignStore for MemoryStore {
	async fn create_campaign(&self, opts: &CreateCampaignOptions) -> CpResult<Box<str>> {
		let campaign_id: Box<str> = random_id()?.into();
		let record = CampaignRecord {
			campaign_id: campaign_id.clone(),
			name: opts.name.clone(),
			subject: opts.subject.clone(),
			status: CampaignStatus::Running,
			total_recipients: opts.total_recipients,
			sent_count: 0,
			success_count: 0,
			failed_count: 0,
			selected_senders: opts.selected_senders.clone(),
			start_time: Timestamp::now(),
			end_time: None,
			email_logs: Vec::new(),
		};
		lock!(self.campaigns)?.push(record);
		Ok(campaign_id)
	}

	async fn append_log(&self, campaign_id: &str, entry: &EmailLogEntry) -> CpResult<()> {
		let mut campaigns = lock!(self.campaigns)?;
		let record = campaigns
			.iter_mut()
			.find(|c| c.campaign_id.as_ref() == campaign_id)
			.ok_or(Error::NotFound)?;
		record.email_logs.insert(0, entry.clone());
		record.email_logs.truncate(MAX_EMAIL_LOGS);
		Ok(())
	}

	async fn update_progress(
		&self,
		campaign_id: &str,
		patch: &CampaignProgressPatch,
	) -> CpResult<()> {
		let mut campaigns = lock!(self.campaigns)?;
		let record = campaigns
			.iter_mut()
			.find(|c| c.campaign_id.as_ref() == campaign_id)
			.ok_or(Error::NotFound)?;
		if let Some(sent) = patch.sent_count {
			record.sent_count = sent;
		}
		if let Some(success) = patch.success_count {
			record.success_count = success;
		}
		if let Some(failed) = patch.failed_count {
			record.failed_count = failed;
		}
		if let Some(status) = patch.status {
			record.status = status;
		}
		if let Some(end_time) = patch.end_time {
			record.end_time = Some(end_time);
		}
		Ok(())
	}

	async fn read_campaign(&self, campaign_id: &str) -> CpResult<CampaignRecord> {
		let campaigns = lock!(self.campaigns)?;
		campaigns
			.iter()
			.find(|c| c.campaign_id.as_ref() == campaign_id)
			.cloned()
			.ok_or(Error::NotFound)
	}

	async fn list_campaigns(&self, opts: ListCampaignOptions) -> CpResult<Vec<CampaignRecord>> {
		let campaigns = lock!(self.campaigns)?;
		let limit = opts.limit.unwrap_or(u32::MAX) as usize;
		Ok(campaigns
			.iter()
			.rev()
			.take(limit)
			.map(|c| CampaignRecord { email_logs: Vec::new(), ..c.clone() })
			.collect())
	}
}

/// Store double whose every call fails, for best-effort persistence tests
pub struct FailingStore;

impl FailingStore {
	pub fn new() -> Arc<Self> {
		Arc::new(Self)
	}
}

#[async_trait]
impl CampaignStore for FailingStore {
	async fn create_campaign(&self, _opts: &CreateCampaignOptions) -> CpResult<Box<str>> {
		Err(Error::DbError)
	}

	async fn append_log(&self, _campaign_id: &str, _entry: &EmailLogEntry) -> CpResult<()> {
		Err(Error::DbError)
	}

	async fn update_progress(
		&self,
		_campaign_id: &str,
		_patch: &CampaignProgressPatch,
	) -> CpResult<()> {
		Err(Error::DbError)
	}

	async fn read_campaign(&self, _campaign_id: &str) -> CpResult<CampaignRecord> {
		Err(Error::DbError)
	}

	async fn list_campaigns(&self, _opts: ListCampaignOptions) -> CpResult<Vec<CampaignRecord>> {
		Err(Error::DbError)
	}
}

// vim: ts=4
