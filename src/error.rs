//! Error taxonomy for the entity store and the session service.

/// Errors raised by store, substrate and session operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `update` was called with an id that is not in the collection.
    #[error("no {entity} record with id {id}")]
    NotFound { entity: String, id: String },

    /// Login with an unknown email or a wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Signup with an email that is already registered.
    #[error("an account with email {0} already exists")]
    DuplicateAccount(String),

    /// Password reset for an email that is neither registered nor a demo account.
    #[error("no account found for {0}")]
    AccountNotFound(String),

    /// Profile mutation while no session is present.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Input or stored data does not have the expected record shape.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Failure reported by the key-value substrate.
    #[error("storage substrate error: {0}")]
    Substrate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<lmdb::Error> for StoreError {
    fn from(err: lmdb::Error) -> Self {
        StoreError::Substrate(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
