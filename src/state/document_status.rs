use std::fmt;

/// Indexing status of a stored document
///
/// Every insert or content change puts a document back to `Pending` so the
/// indexer picks it up again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    /// Content stored, postings not yet (re)built
    Pending,

    /// Postings match the stored content
    Indexed,
}

impl DocumentStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Indexed => "indexed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "indexed" => Some(Self::Indexed),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
