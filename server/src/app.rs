//! App state type

use std::sync::Arc;

use coldpost_engine::state::CampaignHub;
use coldpost_engine::CampaignRunner;
use coldpost_types::store::CampaignStore;
use coldpost_types::transport::EmailTransport;
use coldpost_types::types::SenderIdentity;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub hub: Arc<CampaignHub>,
	pub runner: CampaignRunner,
	pub store: Arc<dyn CampaignStore>,
	/// Verified sender identities available to campaigns
	pub senders: Vec<SenderIdentity>,
}

pub type App = Arc<AppState>;

impl AppState {
	pub fn new(
		transport: Arc<dyn EmailTransport>,
		store: Arc<dyn CampaignStore>,
		senders: Vec<SenderIdentity>,
	) -> App {
		let hub = CampaignHub::new();
		let runner = CampaignRunner::new(hub.clone(), transport, store.clone());
		Arc::new(Self { hub, runner, store, senders })
	}
}

// vim: ts=4
