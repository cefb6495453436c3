use std::time::{SystemTime, UNIX_EPOCH};

use lingopack_core::EngineError;
use lingopack_domain::ErrorBody;

pub(crate) fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Correlation ids are attached only outside release builds.
fn correlation_id() -> Option<String> {
    if cfg!(debug_assertions) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Some(format!("{nanos:x}"))
    } else {
        None
    }
}

/// Structured body for the `{ok:false, error}` envelope.
pub fn error_body(err: &EngineError) -> ErrorBody {
    ErrorBody {
        kind: err.kind().to_string(),
        message: err.to_string(),
        correlation_id: correlation_id(),
    }
}
