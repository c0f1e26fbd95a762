use axum::{
	Router,
	routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::app::App;
use crate::campaign;

pub fn init(state: App) -> Router {
	Router::new()
		.route("/api/campaign", post(campaign::handler::start_campaign))
		.route("/api/campaign/pause", post(campaign::handler::pause_campaign))
		.route("/api/campaign/resume", post(campaign::handler::resume_campaign))
		.route("/api/campaign/stop", post(campaign::handler::stop_campaign))
		.route("/api/campaign/reset", post(campaign::handler::reset_campaign))
		.route("/api/campaign/status", get(campaign::handler::campaign_status))
		.route("/api/campaign/log", get(campaign::handler::campaign_log))
		.route("/api/campaigns", get(campaign::handler::list_campaigns))
		.route("/api/campaigns/{id}", get(campaign::handler::campaign_details))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

// vim: ts=4
