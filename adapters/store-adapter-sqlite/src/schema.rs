//! Database schema initialization

use sqlx::SqlitePool;

/// Create tables and indexes when missing
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS campaigns (
		campaign_id text NOT NULL,
		name text NOT NULL,
		subject text NOT NULL,
		body text NOT NULL,
		status text NOT NULL,
		total_recipients integer NOT NULL,
		sent_count integer NOT NULL DEFAULT 0,
		success_count integer NOT NULL DEFAULT 0,
		failed_count integer NOT NULL DEFAULT 0,
		selected_senders json NOT NULL,
		start_time datetime NOT NULL,
		end_time datetime,
		updated_at datetime NOT NULL,
		PRIMARY KEY(campaign_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS email_logs (
		log_id integer PRIMARY KEY AUTOINCREMENT,
		campaign_id text NOT NULL,
		recipient text NOT NULL,
		name text,
		status text NOT NULL,
		error text,
		sender text NOT NULL,
		created_at datetime NOT NULL
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_email_logs_campaign ON email_logs (campaign_id, log_id)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
