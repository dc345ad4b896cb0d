//! ghcontrib Result Store
//!
//! Contribution snapshots collected per user and year, kept in memory for one run.

mod models;
mod store;

pub use models::*;
pub use store::ResultStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Snapshot for {0} has an empty login")]
    EmptyLogin(UserYear),

    #[error("Snapshot for {0} is already stored")]
    DuplicateKey(UserYear),
}

pub type Result<T> = std::result::Result<T, StoreError>;
