use crate::pos::BlockPos;

/// Rejected structural or control requests. The index is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KineticError {
    #[error("position {0:?} is already occupied")]
    Occupied(BlockPos),
    #[error("no node at position {0:?}")]
    NotFound(BlockPos),
    #[error("node at position {0:?} is not a generator")]
    NotAGenerator(BlockPos),
}

/// Errors from saving or loading network layouts.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
    #[error("save data places two nodes at {0:?}")]
    DuplicatePosition(BlockPos),
    #[error("could not rebuild saved layout: {0}")]
    Rebuild(KineticError),
}
