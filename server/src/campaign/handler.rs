//! REST handlers for starting, controlling, and observing campaigns
//!
//! Control handlers only mutate the shared state hub; the driver task
//! observes the change at its next checkpoint. Status persistence to the
//! store is best-effort, mirroring the driver's own behavior.

use axum::{
	Json,
	extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::prelude::*;
use coldpost_engine::CampaignSpec;
use coldpost_engine::intake::sanitize_recipients;
use coldpost_engine::schedule::TimezoneConfig;
use coldpost_engine::state::CampaignState;
use coldpost_types::store::{CampaignProgressPatch, ListCampaignOptions};
use coldpost_types::types::{CampaignStatus, Recipient};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCampaignRequest {
	pub campaign_name: String,
	pub subject: String,
	pub text: String,
	pub recipients: Vec<Recipient>,
	#[serde(default)]
	pub selected_senders: Option<Vec<String>>,
	#[serde(default)]
	pub timezone_config: Option<TimezoneConfig>,
}

/// POST /api/campaign — validate and start a campaign run.
/// Responds 409 while another campaign is active.
pub async fn start_campaign(
	State(app): State<App>,
	Json(req): Json<StartCampaignRequest>,
) -> CpResult<Json<Value>> {
	if req.campaign_name.is_empty() || req.subject.is_empty() || req.text.is_empty() {
		return Err(Error::ValidationError(
			"campaign name, subject, text, and recipients are required".into(),
		));
	}

	let recipients = sanitize_recipients(req.recipients);
	if recipients.is_empty() {
		return Err(Error::ValidationError("no valid recipients".into()));
	}

	let senders = match &req.selected_senders {
		Some(filter) if !filter.is_empty() => app
			.senders
			.iter()
			.filter(|s| filter.iter().any(|f| f == s.address.as_ref()))
			.cloned()
			.collect(),
		_ => app.senders.clone(),
	};
	if senders.is_empty() {
		return Err(Error::ValidationError("no available senders after filtering".into()));
	}

	let launched = app
		.runner
		.launch(CampaignSpec {
			name: req.campaign_name.into(),
			subject: req.subject.into(),
			body: req.text.into(),
			recipients,
			senders,
			timezone: req.timezone_config,
		})
		.await?;

	Ok(Json(json!({
		"success": true,
		"message": "Campaign started successfully",
		"totalRecipients": launched.total_recipients,
		"campaignId": launched.campaign_id,
	})))
}

/// POST /api/campaign/pause
pub async fn pause_campaign(State(app): State<App>) -> CpResult<Json<Value>> {
	app.hub.pause(None);
	let status = app.hub.snapshot();
	persist_status(&app, &status, CampaignStatus::Paused, false).await;
	info!("campaign paused via API");
	Ok(Json(json!({ "success": true, "message": "Campaign paused successfully", "status": status })))
}

/// POST /api/campaign/resume
pub async fn resume_campaign(State(app): State<App>) -> CpResult<Json<Value>> {
	app.hub.resume();
	let status = app.hub.snapshot();
	persist_status(&app, &status, CampaignStatus::Running, false).await;
	info!("campaign resumed via API");
	Ok(Json(json!({ "success": true, "message": "Campaign resumed successfully", "status": status })))
}

/// POST /api/campaign/stop
pub async fn stop_campaign(State(app): State<App>) -> CpResult<Json<Value>> {
	app.hub.stop();
	let status = app.hub.snapshot();
	persist_status(&app, &status, CampaignStatus::Stopped, true).await;
	info!("campaign stopped via API");
	Ok(Json(json!({ "success": true, "message": "Campaign stopped successfully", "status": status })))
}

/// POST /api/campaign/reset — clear the slot; rejected while running
pub async fn reset_campaign(State(app): State<App>) -> CpResult<Json<Value>> {
	app.hub.reset()?;
	Ok(Json(json!({ "success": true, "message": "Campaign reset successfully" })))
}

/// GET /api/campaign/status — snapshot for the UI poller
pub async fn campaign_status(State(app): State<App>) -> Json<CampaignState> {
	Json(app.hub.snapshot())
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
	pub limit: Option<usize>,
}

/// GET /api/campaign/log?limit=N — recent per-email log, newest first
pub async fn campaign_log(
	State(app): State<App>,
	Query(query): Query<LogQuery>,
) -> Json<Value> {
	let entries = app.hub.recent_log(query.limit.unwrap_or(50));
	Json(json!({ "count": entries.len(), "emails": entries }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
	pub limit: Option<u32>,
}

/// GET /api/campaigns — persisted campaign documents, newest first
pub async fn list_campaigns(
	State(app): State<App>,
	Query(query): Query<ListQuery>,
) -> CpResult<Json<Value>> {
	let campaigns =
		app.store.list_campaigns(ListCampaignOptions { limit: query.limit }).await?;
	Ok(Json(json!({ "count": campaigns.len(), "campaigns": campaigns })))
}

/// GET /api/campaigns/{id} — one persisted campaign with its recent logs
pub async fn campaign_details(
	State(app): State<App>,
	Path(campaign_id): Path<String>,
) -> CpResult<Json<Value>> {
	let record = app.store.read_campaign(&campaign_id).await?;
	Ok(Json(json!({ "campaign": record })))
}

/// Persist a control-surface status change; failures are logged, not
/// surfaced — the in-memory state remains the source of truth.
async fn persist_status(
	app: &App,
	status: &CampaignState,
	new_status: CampaignStatus,
	with_end_time: bool,
) {
	let Some(campaign_id) = status.campaign_id.as_deref() else { return };
	let patch = CampaignProgressPatch {
		status: Some(new_status),
		end_time: with_end_time.then(Timestamp::now),
		..CampaignProgressPatch::default()
	};
	if let Err(err) = app.store.update_progress(campaign_id, &patch).await {
		warn!("failed to persist campaign status change: {}", err);
	}
}

// vim: ts=4
