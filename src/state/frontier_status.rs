/// Frontier status definitions for tracking crawl progress
///
/// This module defines the states a crawl queue entry moves through.
use std::fmt;

/// Represents the current status of a URL in the crawl frontier
///
/// The normal path is `Pending -> Processing -> Completed`. A failed attempt
/// moves a `Processing` entry back to `Pending` until its attempts are used
/// up, after which it lands in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontierStatus {
    /// Waiting to be claimed by a crawler
    Pending,

    /// Claimed by a crawler and currently being fetched
    Processing,

    /// Fetched, extracted and stored
    Completed,

    /// Gave up after exhausting all attempts
    Failed,
}

impl FrontierStatus {
    /// Returns true if no further processing will happen for this entry
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all frontier statuses
    pub fn all_statuses() -> [Self; 4] {
        [
            Self::Pending,
            Self::Processing,
            Self::Completed,
            Self::Failed,
        ]
    }
}

impl fmt::Display for FrontierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
