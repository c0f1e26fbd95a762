pub use crate::app::App;
pub use coldpost_types::error::{CpResult, Error};
pub use coldpost_types::types::Timestamp;

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
