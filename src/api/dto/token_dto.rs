//! Token queue DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{DepartmentId, PatientId, Token, TokenPriority, TokenStatus};

/// Request body for `POST /departments/{id}/tokens`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    /// Ticket holder.
    pub patient_id: PatientId,
    /// Requested priority. Defaults to normal.
    #[serde(default)]
    pub priority: TokenPriority,
}

/// Query parameters for `GET /departments/{id}/tokens`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TokenQueueParams {
    /// Only tokens in this status; open tokens when omitted.
    #[serde(default)]
    pub status: Option<TokenStatus>,
}

/// Request body for `PATCH /tokens/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTokenStatusRequest {
    /// Target status.
    pub status: TokenStatus,
}

/// Ordered queue for `GET /departments/{id}/tokens`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenQueueResponse {
    /// Department the queue belongs to.
    pub department_id: DepartmentId,
    /// Tokens in serving order.
    pub tokens: Vec<Token>,
    /// Tokens still waiting to be called.
    pub waiting: usize,
}

impl TokenQueueResponse {
    /// Wraps an ordered queue.
    #[must_use]
    pub fn new(department_id: DepartmentId, tokens: Vec<Token>) -> Self {
        let waiting = tokens
            .iter()
            .filter(|t| t.status == TokenStatus::Waiting)
            .count();
        Self {
            department_id,
            tokens,
            waiting,
        }
    }
}
