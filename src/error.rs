use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhrasebookError {
    #[error("Failed to query the phrase store: {0}")]
    StoreQueryError(rusqlite::Error),
    #[error("Phrase store is unavailable")]
    StoreUnavailable,
    #[error("Phrase not found: {0}")]
    PhraseNotFound(i64),
}
