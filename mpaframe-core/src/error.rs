// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `error` module defines the error type shared by every crate in the workspace.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::result;

/// `MpaError` enumerates every way a bit-stream operation in this workspace can fail.
#[derive(Debug)]
pub enum MpaError {
    /// An IO error occurred while reading from the byte source.
    IoError(Box<dyn StdError + Send + Sync>),
    /// The stream contained malformed bytes that could not be decoded (bad sync, a tag that
    /// claims an impossible size, an inconsistent encode). Recoverable by resync.
    DataError(&'static str),
    /// A field decoded to a value the format reserves (e.g. bitrate index 15). The caller
    /// decides whether to resync or reject.
    ReservedError(&'static str),
    /// The API was misused: an out-of-range field write, `advance` past the buffered length,
    /// a side-info field accessed under the wrong `blocksplit_flag`, or similar.
    UsageError(&'static str),
    /// A resource bound (e.g. the sync buffer's maximum size) was reached with no item
    /// decidable from the data seen so far.
    ImplementationLimit(&'static str),
}

impl fmt::Display for MpaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MpaError::IoError(err) => write!(f, "io error: {}", err),
            MpaError::DataError(msg) => write!(f, "malformed stream: {}", msg),
            MpaError::ReservedError(msg) => write!(f, "reserved field value: {}", msg),
            MpaError::UsageError(msg) => write!(f, "usage error: {}", msg),
            MpaError::ImplementationLimit(msg) => write!(f, "implementation limit: {}", msg),
        }
    }
}

impl StdError for MpaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            MpaError::IoError(err) => Some(err.deref()),
            _ => None,
        }
    }
}

impl From<io::Error> for MpaError {
    fn from(err: io::Error) -> MpaError {
        MpaError::IoError(Box::new(err))
    }
}

pub type Result<T> = result::Result<T, MpaError>;

/// Convenience function to create a data error.
pub fn decode_error<T>(desc: &'static str) -> Result<T> {
    Err(MpaError::DataError(desc))
}

/// Convenience function to create a reserved-field error.
pub fn reserved_error<T>(desc: &'static str) -> Result<T> {
    Err(MpaError::ReservedError(desc))
}

/// Convenience function to create a usage error.
pub fn usage_error<T>(desc: &'static str) -> Result<T> {
    Err(MpaError::UsageError(desc))
}

/// Convenience function to create an implementation-limit error.
pub fn limit_error<T>(desc: &'static str) -> Result<T> {
    Err(MpaError::ImplementationLimit(desc))
}

/// Returns `true` if the error should be treated as a resync signal rather than propagated:
/// a [`MpaError::DataError`] or [`MpaError::ReservedError`] encountered while speculatively
/// parsing a frame at a candidate sync position.
pub fn is_resync_signal(err: &MpaError) -> bool {
    matches!(err, MpaError::DataError(_) | MpaError::ReservedError(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_and_reserved_errors_are_resync_signals() {
        assert!(is_resync_signal(&MpaError::DataError("x")));
        assert!(is_resync_signal(&MpaError::ReservedError("x")));
        assert!(!is_resync_signal(&MpaError::UsageError("x")));
        assert!(!is_resync_signal(&MpaError::ImplementationLimit("x")));
    }

    #[test]
    fn display_includes_message() {
        let err = MpaError::DataError("invalid sync");
        assert_eq!(format!("{}", err), "malformed stream: invalid sync");
    }
}
