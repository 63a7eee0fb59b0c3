use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
}

impl ErrorResponse {
    pub(super) fn new(error: &'static str, message: String) -> Self {
        Self {
            success: false,
            error,
            message,
        }
    }
}
