//! Moderation models: content flags and listing comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Flag status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum FlagStatus {
    /// Waiting for staff review
    Open,
    /// Reviewed; listing stays up
    Dismissed,
    /// Reviewed; listing removed
    Upheld,
}

/// A member's report against a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Flag {
    /// Unique flag ID
    pub id: Uuid,
    /// Flagged listing
    pub listing_id: Uuid,
    /// Reporting account
    pub reporter_id: Uuid,
    /// Reporter's reason
    pub reason: String,
    /// Current status
    pub status: FlagStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Flag {
    /// Create a new open flag
    pub fn new(listing_id: Uuid, reporter_id: Uuid, reason: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            listing_id,
            reporter_id,
            reason,
            status: FlagStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A comment on a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,
    /// Listing the comment is on
    pub listing_id: Uuid,
    /// Commenting account
    pub author_id: Uuid,
    /// Comment text
    pub body: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment
    pub fn new(listing_id: Uuid, author_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            listing_id,
            author_id,
            body,
            created_at: Utc::now(),
        }
    }
}
