//! Department queue tokens: state machine and ordering.
//!
//! A token walks `Waiting → Called → InProgress → Completed`. Any
//! non-terminal token may be cancelled. `Completed` and `Cancelled` are
//! terminal; nothing leaves them.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DepartmentId, PatientId, TokenId};
use crate::error::OpsError;

/// Service priority requested at issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenPriority {
    /// Regular walk-in.
    #[default]
    Normal,
    /// Needs to be seen soon.
    Urgent,
    /// Seen before everyone else.
    Emergency,
}

text_enum!(TokenPriority, "token priority" {
    Normal => "normal",
    Urgent => "urgent",
    Emergency => "emergency",
});

impl TokenPriority {
    /// Queue rank; higher is served first.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Urgent => 1,
            Self::Emergency => 2,
        }
    }
}

/// Token lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// In the queue.
    Waiting,
    /// Called to the counter.
    Called,
    /// Being served.
    InProgress,
    /// Served.
    Completed,
    /// Withdrawn.
    Cancelled,
}

text_enum!(TokenStatus, "token status" {
    Waiting => "waiting",
    Called => "called",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl TokenStatus {
    /// Statuses that still hold a place in the department's queue.
    pub const OPEN: [Self; 3] = [Self::Waiting, Self::Called, Self::InProgress];

    /// Returns `true` for `Completed` and `Cancelled`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Statuses reachable from `self` in one step.
    #[must_use]
    pub const fn valid_transitions(&self) -> &'static [Self] {
        match self {
            Self::Waiting => &[Self::Called, Self::Cancelled],
            Self::Called => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    /// Returns `true` if `self → to` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validates `self → to`.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::InvalidTransition`] for any move the state
    /// machine does not list, including cancelling a terminal token.
    pub fn validate_transition(&self, to: Self) -> Result<(), OpsError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(OpsError::transition(self, to))
        }
    }
}

/// A queue ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Token {
    /// Unique identifier.
    pub id: TokenId,
    /// Sequential number within the department, from 1.
    pub number: i32,
    /// Ticket holder.
    pub patient_id: PatientId,
    /// Issuing department.
    pub department_id: DepartmentId,
    /// Requested priority.
    pub priority: TokenPriority,
    /// Lifecycle status.
    pub status: TokenStatus,
    /// Wait estimate computed at issue time.
    pub estimated_wait_minutes: i32,
    /// Issue timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Serving order: higher priority first, then earlier issue, then lower
/// number.
#[must_use]
pub fn queue_order(a: &Token, b: &Token) -> Ordering {
    b.priority
        .rank()
        .cmp(&a.priority.rank())
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.number.cmp(&b.number))
}

/// Sorts tokens into serving order.
pub fn sort_queue(tokens: &mut [Token]) {
    tokens.sort_by(queue_order);
}

/// Counts waiting tokens that would be served before a new token with
/// `priority` issued now.
#[must_use]
pub fn waiting_ahead(queue: &[Token], priority: TokenPriority) -> usize {
    queue
        .iter()
        .filter(|t| t.status == TokenStatus::Waiting && t.priority.rank() >= priority.rank())
        .count()
}

/// Wait estimate for a token with `ahead` tokens before it.
#[must_use]
pub fn estimate_wait_minutes(ahead: usize, minutes_per_token: u32) -> i32 {
    let ahead = i32::try_from(ahead).unwrap_or(i32::MAX);
    let per_token = i32::try_from(minutes_per_token).unwrap_or(i32::MAX);
    ahead.saturating_mul(per_token)
}

/// The waiting token that should be called next.
#[must_use]
pub fn next_waiting(queue: &[Token]) -> Option<&Token> {
    queue
        .iter()
        .filter(|t| t.status == TokenStatus::Waiting)
        .min_by(|a, b| queue_order(a, b))
}
