//! Remote file system access.
//!
//! The pruner only ever talks to a [`RemoteFs`]: list a directory, remove a
//! file, remove an (empty) directory. [`sftp::SftpSession`] is the real
//! implementation; [`memory::MemoryFs`] models a remote tree in memory.

pub mod memory;
pub mod sftp;

use std::fmt;

use serde::Serialize;

use crate::common::errors::RemoteError;

pub use memory::MemoryFs;
pub use sftp::{ConnectOptions, Credential, SftpSession};

/// Kind of a listing record, as reported by the server's stat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

/// One record from a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Base name for matching and display; invalid UTF-8 shows as U+FFFD
    pub name: String,
    /// Base name exactly as the server sent it
    pub raw_name: Vec<u8>,
    pub kind: EntryKind,
    /// Modification time in seconds since the epoch, `None` when the server omits it
    pub modified: Option<u64>,
    /// Size in bytes; always 0 for directories
    pub size: u64,
}

impl Entry {
    pub fn file(name: impl Into<String>, modified: u64, size: u64) -> Self {
        let name = name.into();
        Self {
            raw_name: name.clone().into_bytes(),
            name,
            kind: EntryKind::File,
            modified: Some(modified),
            size,
        }
    }

    pub fn directory(name: impl Into<String>, modified: u64) -> Self {
        let name = name.into();
        Self {
            raw_name: name.clone().into_bytes(),
            name,
            kind: EntryKind::Directory,
            modified: Some(modified),
            size: 0,
        }
    }

    /// Build an entry from the bytes the server sent, decoding the name lossily
    pub fn from_raw(raw_name: Vec<u8>, kind: EntryKind, modified: Option<u64>, size: u64) -> Self {
        Self {
            name: String::from_utf8_lossy(&raw_name).into_owned(),
            raw_name,
            kind,
            modified,
            size,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A path on the server, held as the exact bytes the server uses.
///
/// Remote paths are POSIX regardless of the local platform, so joining never
/// goes through `std::path`. `Display` decodes lossily and is only meant for
/// logs, reports and error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RemotePath(Vec<u8>);

impl RemotePath {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Append a base name with `/`, never doubling an existing trailing slash
    pub fn join(&self, name: &[u8]) -> RemotePath {
        let mut joined = Vec::with_capacity(self.0.len() + name.len() + 1);
        joined.extend_from_slice(&self.0);
        if !joined.is_empty() && !joined.ends_with(b"/") {
            joined.push(b'/');
        }
        joined.extend_from_slice(name);
        RemotePath(joined)
    }
}

impl From<&str> for RemotePath {
    fn from(path: &str) -> Self {
        Self(path.as_bytes().to_vec())
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// The operations the pruner needs from a remote file system session.
///
/// Every call blocks until the server answers. Failures are returned, never
/// retried.
pub trait RemoteFs {
    /// List `path` in the order the server returns it, without `.` and `..`
    fn list_entries(&mut self, path: &RemotePath) -> Result<Vec<Entry>, RemoteError>;

    /// Remove a single file. Fails if the path is missing or not a file.
    fn remove_file(&mut self, path: &RemotePath) -> Result<(), RemoteError>;

    /// Remove a directory. Fails if it is missing or not empty.
    fn remove_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError>;
}

impl<T: RemoteFs + ?Sized> RemoteFs for &mut T {
    fn list_entries(&mut self, path: &RemotePath) -> Result<Vec<Entry>, RemoteError> {
        (**self).list_entries(path)
    }

    fn remove_file(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        (**self).remove_file(path)
    }

    fn remove_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        (**self).remove_dir(path)
    }
}
