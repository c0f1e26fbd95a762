//! Campaign store adapter trait
//!
//! Persists campaign documents and their capped email logs. All calls made
//! by the driver are best-effort: a store failure is logged and the campaign
//! continues, with the in-memory state remaining the source of truth.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::types::{CampaignStatus, EmailLogEntry, serialize_timestamp_iso};

/// Maximum number of log entries kept per campaign, both in memory and in
/// the persisted document (oldest evicted first).
pub const MAX_EMAIL_LOGS: usize = 200;

#[derive(Debug, Clone)]
pub struct CreateCampaignOptions {
	pub name: Box<str>,
	pub subject: Box<str>,
	pub body: Box<str>,
	pub total_recipients: u32,
	pub selected_senders: Vec<Box<str>>,
}

/// Partial update of a campaign's progress counters and status
#[derive(Debug, Clone, Default)]
pub struct CampaignProgressPatch {
	pub sent_count: Option<u32>,
	pub success_count: Option<u32>,
	pub failed_count: Option<u32>,
	pub status: Option<CampaignStatus>,
	pub end_time: Option<Timestamp>,
}

/// A persisted campaign document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
	pub campaign_id: Box<str>,
	pub name: Box<str>,
	pub subject: Box<str>,
	pub status: CampaignStatus,
	pub total_recipients: u32,
	pub sent_count: u32,
	pub success_count: u32,
	pub failed_count: u32,
	pub selected_senders: Vec<Box<str>>,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub start_time: Timestamp,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub end_time: Option<Timestamp>,
	/// Most recent log entries, newest first (empty in list results)
	pub email_logs: Vec<EmailLogEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListCampaignOptions {
	pub limit: Option<u32>,
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
	/// Create a campaign document, returning its id
	async fn create_campaign(&self, opts: &CreateCampaignOptions) -> CpResult<Box<str>>;

	/// Append a log entry, evicting the oldest beyond [`MAX_EMAIL_LOGS`]
	async fn append_log(&self, campaign_id: &str, entry: &EmailLogEntry) -> CpResult<()>;

	/// Merge a progress patch into the campaign document
	async fn update_progress(
		&self,
		campaign_id: &str,
		patch: &CampaignProgressPatch,
	) -> CpResult<()>;

	/// Fetch one campaign with its recent log entries (newest first)
	async fn read_campaign(&self, campaign_id: &str) -> CpResult<CampaignRecord>;

	/// List campaign documents without logs, newest first
	async fn list_campaigns(&self, opts: ListCampaignOptions) -> CpResult<Vec<CampaignRecord>>;
}

// vim: ts=4
