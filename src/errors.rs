//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`MarrowError`] covers the failure modes of the
//! engine core:
//! - File I/O failures while opening asset files
//! - Structural errors in animation/skeleton/skin text files
//!
//! Everything below the file level is recovered locally: unrecognised
//! tokens are logged and skipped, numeric degeneracies are logged and the
//! affected computation is dropped for that entity. Nothing in the core is
//! fatal at runtime — the frame loop never halts on bad data.
//!
//! # Usage
//!
//! Public load APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, MarrowError>`.

use thiserror::Error;

/// The main error type for the Marrow engine core.
#[derive(Error, Debug)]
pub enum MarrowError {
    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Asset Parsing Errors
    // ========================================================================
    /// A required token was missing or malformed beyond local recovery.
    #[error("Parse error: {context}")]
    Parse {
        /// Description of what was being parsed
        context: String,
    },

    /// A structural mismatch that rejects the whole load (e.g. a channel
    /// declaring zero keys).
    #[error("Load error: {0}")]
    Load(String),
}

impl MarrowError {
    /// Shorthand for a [`MarrowError::Parse`] with a formatted context.
    #[must_use]
    pub fn parse(context: impl Into<String>) -> Self {
        MarrowError::Parse {
            context: context.into(),
        }
    }
}

/// Alias for `Result<T, MarrowError>`.
pub type Result<T> = std::result::Result<T, MarrowError>;
