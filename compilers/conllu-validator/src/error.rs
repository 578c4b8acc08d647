use conllu_protocol::ArchiveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
