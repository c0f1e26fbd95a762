pub use coldpost_types::error::{CpResult, Error};
pub use coldpost_types::types::Timestamp;

pub use tracing::{debug, error, info, warn};

// vim: ts=4
