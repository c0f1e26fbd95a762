use std::sync::Arc;

use coldpost_server::{AppState, Config, routes};
use coldpost_store_adapter_sqlite::CampaignStoreSqlite;
use coldpost_transport_smtp::SmtpEmailTransport;
use coldpost_types::prelude::*;

#[tokio::main]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.init();

	if let Err(err) = run().await {
		error!("fatal: {}", err);
		std::process::exit(1);
	}
}

async fn run() -> CpResult<()> {
	let config = Config::from_env()?;

	if let Some(data_dir) = config.db_path.parent() {
		tokio::fs::create_dir_all(data_dir).await?;
	}

	let store = Arc::new(CampaignStoreSqlite::new(&config.db_path).await?);
	let transport = Arc::new(SmtpEmailTransport::new(&config.smtp)?);
	let app = AppState::new(transport, store, config.senders.clone());

	let listener = tokio::net::TcpListener::bind(&config.listen).await?;
	info!(
		"coldpost {} listening on {} ({} senders configured)",
		coldpost_server::app::VERSION,
		config.listen,
		config.senders.len()
	);

	axum::serve(listener, routes::init(app)).await?;
	Ok(())
}

// vim: ts=4
