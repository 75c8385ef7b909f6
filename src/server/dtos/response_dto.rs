use serde::{Deserialize, Serialize};

/// envelope for anything that fails before the first byte is sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
