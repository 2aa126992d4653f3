use chrono::{DateTime, Utc};

/// A phrase someone has searched for. The text is normalized before storage,
/// so differently-cased or differently-padded searches count against the same
/// record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub id: i64,
    pub text: String,
    pub search_count: i64,
    pub last_searched: DateTime<Utc>,
}
