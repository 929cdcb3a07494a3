//! Custom error types for sftpsweep operations.
//! We use `anyhow` at the top level for CLI error handling,
//! but these typed errors allow modules to be precise about failures.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid or contradictory run configuration. Raised before connecting.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A regular expression did not compile
    #[error("Invalid {kind} pattern '{pattern}': {source}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Include and exclude are the same expression
    #[error("include and exclude pattern are equal ('{pattern}')! Nothing will be processed.")]
    ConflictingPatterns { pattern: String },

    /// Age must be a finite, non-negative number of days
    #[error("Invalid age '{age}': must be a non-negative number of days")]
    InvalidAge { age: f64 },

    /// Config file is missing or invalid
    #[error("Config error in '{}': {message}", .path.display())]
    File { path: PathBuf, message: String },
}

/// Failure to establish an authenticated SFTP session.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    Tcp {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("SSH handshake with {host} failed: {message}")]
    Handshake { host: String, message: String },

    /// Server key differs from the one recorded in known_hosts
    #[error("Host key for {host} does not match known_hosts entry in '{}'", .known_hosts.display())]
    HostKeyMismatch { host: String, known_hosts: PathBuf },

    #[error("Host {host} is not in known_hosts and strict host key checking is on")]
    UnknownHost { host: String },

    #[error("Authentication failed for {user}@{host}: {message}")]
    Auth {
        user: String,
        host: String,
        message: String,
    },

    /// Auth call returned but the transport is not authenticated
    #[error("Failed to connect to server: session for {user}@{host} is not active")]
    NotAuthenticated { user: String, host: String },

    #[error("Could not open SFTP subsystem on {host}: {message}")]
    Subsystem { host: String, message: String },
}

/// A remote listing or mutation failed.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Failed to list '{path}': {message}")]
    List { path: String, message: String },

    /// The remove-file or remove-directory call was rejected
    #[error("Failed to remove {kind} '{path}': {message}")]
    Remove {
        kind: &'static str,
        path: String,
        message: String,
    },
}

impl RemoteError {
    pub fn list(path: impl ToString, message: impl ToString) -> Self {
        Self::List {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub fn remove_file(path: impl ToString, message: impl ToString) -> Self {
        Self::Remove {
            kind: "file",
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub fn remove_dir(path: impl ToString, message: impl ToString) -> Self {
        Self::Remove {
            kind: "directory",
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Remote path the failed operation targeted
    pub fn path(&self) -> &str {
        match self {
            RemoteError::List { path, .. } | RemoteError::Remove { path, .. } => path,
        }
    }
}

/// Why a traversal stopped early.
#[derive(Debug, Error)]
pub enum PruneError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The operator interrupted the run. Deletions already issued are kept.
    #[error("operation interrupted by user")]
    Interrupted,
}

impl PruneError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, PruneError::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_messages_name_path() {
        let err = RemoteError::remove_dir("/data/old", "directory not empty");
        assert_eq!(err.path(), "/data/old");
        assert_eq!(
            err.to_string(),
            "Failed to remove directory '/data/old': directory not empty"
        );

        let err = RemoteError::list("/missing", "no such file");
        assert!(err.to_string().contains("Failed to list '/missing'"));
    }

    #[test]
    fn test_prune_error_wraps_remote_transparently() {
        let err: PruneError = RemoteError::remove_file("a.txt", "permission denied").into();
        assert!(!err.is_interrupted());
        assert_eq!(err.to_string(), "Failed to remove file 'a.txt': permission denied");
        assert!(PruneError::Interrupted.is_interrupted());
    }

    #[test]
    fn test_conflicting_patterns_message() {
        let err = ConfigError::ConflictingPatterns {
            pattern: "^tmp".to_string(),
        };
        assert!(err.to_string().contains("Nothing will be processed"));
    }
}
