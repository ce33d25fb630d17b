// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Admission of server list files.
//!
//! A list is admitted only if it exists, is a regular file, is non-empty and
//! is no larger than the configured limit. Rejection happens before any
//! line is read or any packet is sent.

use std::fs::File;
use std::io::{self, BufReader, Read, Take};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Largest server list accepted, in bytes.
pub const MAX_SOURCE_BYTES: u64 = 102_400;

/// Why a server list was refused.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The list does not exist, cannot be opened, or is not a regular file.
    #[error("server list {} is missing or unreadable: {source}", .path.display())]
    Missing {
        /// The configured path.
        path: PathBuf,
        /// The underlying open or stat failure.
        #[source]
        source: io::Error,
    },

    /// The list has no content.
    #[error("server list {} is empty", .path.display())]
    Empty {
        /// The configured path.
        path: PathBuf,
    },

    /// The list exceeds the size limit.
    #[error("server list {} is {size} bytes, over the {limit} byte limit", .path.display())]
    TooLarge {
        /// The configured path.
        path: PathBuf,
        /// The list size.
        size: u64,
        /// The limit it exceeded.
        limit: u64,
    },
}

/// Check the admission rules for `path` and return its size.
pub fn check_source(path: &Path, max_bytes: u64) -> Result<u64, SourceError> {
    let meta = std::fs::metadata(path).map_err(|source| SourceError::Missing {
        path: path.to_path_buf(),
        source,
    })?;
    admit(path, &meta, max_bytes)
}

/// Open `path` for line-by-line reading once it passes admission.
///
/// The size is taken from the open handle, so the file checked is the file
/// read. Reads stop at `max_bytes` even if the file grows afterwards.
pub fn open_source(path: &Path, max_bytes: u64) -> Result<BufReader<Take<File>>, SourceError> {
    let missing = |source| SourceError::Missing {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(missing)?;
    let meta = file.metadata().map_err(missing)?;
    let size = admit(path, &meta, max_bytes)?;
    debug!(path = %path.display(), size, "server list admitted");
    Ok(BufReader::new(file.take(max_bytes)))
}

fn admit(path: &Path, meta: &std::fs::Metadata, max_bytes: u64) -> Result<u64, SourceError> {
    if !meta.is_file() {
        return Err(SourceError::Missing {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }
    let size = meta.len();
    if size == 0 {
        return Err(SourceError::Empty {
            path: path.to_path_buf(),
        });
    }
    if size > max_bytes {
        return Err(SourceError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_bytes,
        });
    }
    Ok(size)
}
