//! SQLite-backed campaign store
//!
//! Persists campaign documents and their email logs. The log table is
//! capped per campaign: inserts beyond the limit evict the oldest rows,
//! matching the in-memory ring buffer.

use async_trait::async_trait;
use sqlx::{
	Row,
	sqlite::{self, SqlitePool, SqliteRow},
};
use std::path::Path;

use coldpost::prelude::*;
use coldpost::store::{
	CampaignProgressPatch, CampaignRecord, CampaignStore, CreateCampaignOptions,
	ListCampaignOptions, MAX_EMAIL_LOGS,
};
use coldpost::types::{CampaignStatus, EmailLogEntry, LogStatus};
use coldpost::utils::random_id;

mod schema;

// Helper functions
//******************

fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

fn collect_res<T>(iter: impl Iterator<Item = Result<T, sqlx::Error>>) -> CpResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

fn campaign_from_row(row: &SqliteRow) -> Result<CampaignRecord, sqlx::Error> {
	let status: String = row.try_get("status")?;
	let senders: String = row.try_get("selected_senders")?;
	Ok(CampaignRecord {
		campaign_id: row.try_get::<String, _>("campaign_id")?.into(),
		name: row.try_get::<String, _>("name")?.into(),
		subject: row.try_get::<String, _>("subject")?.into(),
		status: CampaignStatus::parse(&status).unwrap_or(CampaignStatus::Idle),
		total_recipients: row.try_get("total_recipients")?,
		sent_count: row.try_get("sent_count")?,
		success_count: row.try_get("success_count")?,
		failed_count: row.try_get("failed_count")?,
		selected_senders: serde_json::from_str(&senders).unwrap_or_default(),
		start_time: row.try_get("start_time").map(Timestamp)?,
		end_time: row.try_get::<Option<i64>, _>("end_time")?.map(Timestamp),
		email_logs: Vec::new(),
	})
}

fn log_from_row(row: &SqliteRow) -> Result<EmailLogEntry, sqlx::Error> {
	let status: String = row.try_get("status")?;
	Ok(EmailLogEntry {
		recipient: row.try_get::<String, _>("recipient")?.into(),
		name: row.try_get::<Option<String>, _>("name")?.map(Into::into),
		status: if status == "failed" { LogStatus::Failed } else { LogStatus::Sent },
		timestamp: row.try_get("created_at").map(Timestamp)?,
		error: row.try_get::<Option<String>, _>("error")?.map(Into::into),
		sender: row.try_get::<String, _>("sender")?.into(),
	})
}

#[derive(Debug)]
pub struct CampaignStoreSqlite {
	db: SqlitePool,
}

impl CampaignStoreSqlite {
	pub async fn new(path: impl AsRef<Path>) -> CpResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;

		schema::init_db(&db).await.inspect_err(inspect).or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl CampaignStore for CampaignStoreSqlite {
	async fn create_campaign(&self, opts: &CreateCampaignOptions) -> CpResult<Box<str>> {
		let campaign_id = random_id()?;
		let senders =
			serde_json::to_string(&opts.selected_senders).map_err(|_| Error::DbError)?;

		sqlx::query(
			"INSERT INTO campaigns (campaign_id, name, subject, body, status,
			total_recipients, selected_senders, start_time, updated_at)
			VALUES (?, ?, ?, ?, 'running', ?, ?, unixepoch(), unixepoch())",
		)
		.bind(&campaign_id)
		.bind(opts.name.as_ref())
		.bind(opts.subject.as_ref())
		.bind(opts.body.as_ref())
		.bind(opts.total_recipients)
		.bind(&senders)
		.execute(&self.db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

		Ok(campaign_id.into())
	}

	async fn append_log(&self, campaign_id: &str, entry: &EmailLogEntry) -> CpResult<()> {
		let mut tx = self.db.begin().await.map_err(|_| Error::DbError)?;

		sqlx::query(
			"INSERT INTO email_logs (campaign_id, recipient, name, status, error, sender, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)",
		)
		.bind(campaign_id)
		.bind(entry.recipient.as_ref())
		.bind(entry.name.as_deref())
		.bind(entry.status.as_str())
		.bind(entry.error.as_deref())
		.bind(entry.sender.as_ref())
		.bind(entry.timestamp.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

		// keep only the most recent entries per campaign
		sqlx::query(
			"DELETE FROM email_logs WHERE campaign_id = ? AND log_id NOT IN (
				SELECT log_id FROM email_logs WHERE campaign_id = ?
				ORDER BY log_id DESC LIMIT ?
			)",
		)
		.bind(campaign_id)
		.bind(campaign_id)
		.bind(MAX_EMAIL_LOGS as i64)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

		tx.commit().await.map_err(|_| Error::DbError)?;
		Ok(())
	}

	async fn update_progress(
		&self,
		campaign_id: &str,
		patch: &CampaignProgressPatch,
	) -> CpResult<()> {
		let mut query = sqlx::QueryBuilder::new("UPDATE campaigns SET updated_at=unixepoch()");
		if let Some(sent) = patch.sent_count {
			query.push(", sent_count=").push_bind(sent);
		}
		if let Some(success) = patch.success_count {
			query.push(", success_count=").push_bind(success);
		}
		if let Some(failed) = patch.failed_count {
			query.push(", failed_count=").push_bind(failed);
		}
		if let Some(status) = patch.status {
			query.push(", status=").push_bind(status.as_str());
		}
		if let Some(end_time) = patch.end_time {
			query.push(", end_time=").push_bind(end_time.0);
		}
		query.push(" WHERE campaign_id=").push_bind(campaign_id);

		let res = query
			.build()
			.execute(&self.db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
		if res.rows_affected() == 0 {
			return Err(Error::NotFound);
		}
		Ok(())
	}

	async fn read_campaign(&self, campaign_id: &str) -> CpResult<CampaignRecord> {
		let row = sqlx::query(
			"SELECT campaign_id, name, subject, status, total_recipients, sent_count,
			success_count, failed_count, selected_senders, start_time, end_time
			FROM campaigns WHERE campaign_id = ?",
		)
		.bind(campaign_id)
		.fetch_one(&self.db)
		.await;

		let mut record = match row {
			Ok(row) => {
				campaign_from_row(&row).inspect_err(inspect).map_err(|_| Error::DbError)?
			}
			Err(sqlx::Error::RowNotFound) => return Err(Error::NotFound),
			Err(err) => {
				inspect(&err);
				return Err(Error::DbError);
			}
		};

		let logs = sqlx::query(
			"SELECT recipient, name, status, error, sender, created_at
			FROM email_logs WHERE campaign_id = ? ORDER BY log_id DESC LIMIT ?",
		)
		.bind(campaign_id)
		.bind(MAX_EMAIL_LOGS as i64)
		.fetch_all(&self.db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

		record.email_logs = collect_res(logs.iter().map(log_from_row))?;
		Ok(record)
	}

	async fn list_campaigns(&self, opts: ListCampaignOptions) -> CpResult<Vec<CampaignRecord>> {
		let limit = i64::from(opts.limit.unwrap_or(100));
		let rows = sqlx::query(
			"SELECT campaign_id, name, subject, status, total_recipients, sent_count,
			success_count, failed_count, selected_senders, start_time, end_time
			FROM campaigns ORDER BY start_time DESC, campaign_id DESC LIMIT ?",
		)
		.bind(limit)
		.fetch_all(&self.db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

		collect_res(rows.iter().map(campaign_from_row))
	}
}

// vim: ts=4
