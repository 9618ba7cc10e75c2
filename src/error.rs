//! Error taxonomy for a post generation run.
//!
//! Functions in this crate return `anyhow::Result`; the variants below are
//! wrapped inside so callers can classify a failure with
//! `err.downcast_ref::<PostError>()`.

use crate::error_code::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostError {
    /// A required setting is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The generation endpoint answered with a non-success status.
    #[error("remote service error: HTTP {status} - {body}")]
    RemoteService { status: u16, body: String },

    #[error("invalid Oracle error code: {0:?}")]
    InvalidErrorCode(String),

    /// The code is already recorded in the ledger.
    #[error("error code {0} has already been used")]
    DuplicateCode(ErrorCode),

    /// Every attempt was empty, unextractable or a duplicate.
    #[error("no unused Oracle error code obtained after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },
}
