pub mod chatdb;
pub mod db;
pub mod labourdb;
pub mod memory;
pub mod userdb;
pub mod verificationdb;

use thiserror::Error;

pub use chatdb::ChatExt;
pub use db::DBClient;
pub use labourdb::LaborExt;
pub use memory::MemoryStore;
pub use userdb::UserExt;
pub use verificationdb::VerificationExt;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A conditional write found the row in a state it may not move from.
    #[error("{0}")]
    Conflict(String),
}

/// Everything the services need from persistence.
pub trait Store: UserExt + VerificationExt + LaborExt + ChatExt + Send + Sync {}

impl<T> Store for T where T: UserExt + VerificationExt + LaborExt + ChatExt + Send + Sync {}

impl std::fmt::Debug for dyn Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Store")
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
