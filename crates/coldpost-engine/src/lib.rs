//! Campaign execution engine
//!
//! This crate implements the outbound campaign machinery:
//! - Sender allocation planning (balanced, anti-consecutive)
//! - Human-like pacing between sends
//! - Timezone/day/hour schedule gating
//! - Spintax expansion and per-recipient personalization
//! - The cooperative driver loop with pause/resume/stop control
//!
//! Transport and persistence are pluggable via the adapter traits in
//! `coldpost-types`.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod allocation;
pub mod content;
pub mod driver;
pub mod intake;
pub mod pacing;
pub mod schedule;
pub mod state;
pub mod testing;

pub use allocation::AllocationPlan;
pub use driver::{CampaignRunner, CampaignSpec, LaunchedCampaign};
pub use schedule::{SendDays, TimezoneConfig};
pub use state::{CampaignHub, CampaignState};

mod prelude;

// vim: ts=4
