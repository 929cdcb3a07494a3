use std::ffi::OsStr;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ssh2::{CheckResult, FileStat, KnownHostFileKind, Session, Sftp};

use super::{Entry, EntryKind, RemoteFs, RemotePath};
use crate::common::errors::{ConnectionError, RemoteError};

/// How to prove who we are to the server
#[derive(Debug, Clone)]
pub enum Credential {
    Password(String),
    /// Private key file, optionally protected by a passphrase
    KeyFile {
        path: PathBuf,
        passphrase: Option<String>,
    },
    /// Keys offered by a running ssh-agent
    Agent,
}

/// Everything needed to open an [`SftpSession`]
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub credential: Credential,
    /// Applied to every blocking call. `None` waits forever.
    pub timeout: Option<Duration>,
    /// OpenSSH known_hosts file used to verify the server key
    pub known_hosts: Option<PathBuf>,
    /// Refuse hosts that are not in known_hosts
    pub strict_host_keys: bool,
}

impl ConnectOptions {
    pub fn new(host: impl Into<String>, user: impl Into<String>, credential: Credential) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            credential,
            timeout: None,
            known_hosts: default_known_hosts(),
            strict_host_keys: false,
        }
    }
}

/// Default OpenSSH known_hosts location (~/.ssh/known_hosts)
pub fn default_known_hosts() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("known_hosts"))
}

/// An authenticated SFTP channel together with the SSH session carrying it.
///
/// The channel is only usable while the session lives, so both are owned
/// here. Dropping the value closes the channel and disconnects.
pub struct SftpSession {
    sftp: Sftp,
    session: Session,
    host: String,
}

impl SftpSession {
    /// Connect, verify the host key, authenticate and open the SFTP subsystem
    pub fn connect(opts: &ConnectOptions) -> Result<Self, ConnectionError> {
        tracing::debug!(host = %opts.host, port = opts.port, user = %opts.user, "connecting");

        let tcp = open_tcp(&opts.host, opts.port, opts.timeout).map_err(|e| ConnectionError::Tcp {
            host: opts.host.clone(),
            port: opts.port,
            source: e,
        })?;

        let handshake_err = |e: ssh2::Error| ConnectionError::Handshake {
            host: opts.host.clone(),
            message: e.to_string(),
        };

        let mut session = Session::new().map_err(handshake_err)?;
        if let Some(timeout) = opts.timeout {
            session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
        }
        session.set_tcp_stream(tcp);
        session.handshake().map_err(handshake_err)?;

        verify_host_key(&session, opts)?;
        authenticate(&session, opts)?;

        if !session.authenticated() {
            return Err(ConnectionError::NotAuthenticated {
                user: opts.user.clone(),
                host: opts.host.clone(),
            });
        }

        let sftp = session.sftp().map_err(|e| ConnectionError::Subsystem {
            host: opts.host.clone(),
            message: e.to_string(),
        })?;

        tracing::info!(host = %opts.host, user = %opts.user, "sftp session established");

        Ok(Self {
            sftp,
            session,
            host: opts.host.clone(),
        })
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        // The Sftp channel field is dropped after this runs; a failed
        // goodbye only means the server already hung up.
        if let Err(e) = self.session.disconnect(None, "sftpsweep done", None) {
            tracing::debug!(host = %self.host, error = %e, "disconnect failed");
        }
    }
}

impl RemoteFs for SftpSession {
    fn list_entries(&mut self, path: &RemotePath) -> Result<Vec<Entry>, RemoteError> {
        let listing = self
            .sftp
            .readdir(&local_path(path))
            .map_err(|e| RemoteError::list(path, e))?;

        Ok(listing
            .iter()
            .map(|(full_path, stat)| entry_from_stat(full_path, stat))
            .collect())
    }

    fn remove_file(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        self.sftp
            .unlink(&local_path(path))
            .map_err(|e| RemoteError::remove_file(path, e))
    }

    fn remove_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        self.sftp
            .rmdir(&local_path(path))
            .map_err(|e| RemoteError::remove_dir(path, e))
    }
}

/// Open the TCP connection, bounded by `timeout` per resolved address when set
fn open_tcp(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let Some(timeout) = timeout else {
        return TcpStream::connect((host, port));
    };

    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    }))
}

/// Map one `readdir` record to an [`Entry`].
///
/// The base name keeps the server's bytes. Optional attributes stay
/// optional: a missing mtime is `None`, a missing size is 0.
fn entry_from_stat(full_path: &Path, stat: &FileStat) -> Entry {
    let raw_name = full_path
        .file_name()
        .map(os_bytes)
        .unwrap_or_else(|| os_bytes(full_path.as_os_str()));
    let kind = if stat.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    let size = match kind {
        EntryKind::Directory => 0,
        EntryKind::File => stat.size.unwrap_or(0),
    };
    Entry::from_raw(raw_name, kind, stat.mtime, size)
}

#[cfg(unix)]
fn os_bytes(name: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn os_bytes(name: &OsStr) -> Vec<u8> {
    name.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn local_path(path: &RemotePath) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(path.as_bytes()))
}

#[cfg(not(unix))]
fn local_path(path: &RemotePath) -> PathBuf {
    PathBuf::from(path.to_string())
}

/// Check the server key against known_hosts.
///
/// A mismatch is always fatal. An unknown host is accepted with a warning
/// unless strict checking is on.
fn verify_host_key(session: &Session, opts: &ConnectOptions) -> Result<(), ConnectionError> {
    let Some(known_hosts_path) = opts.known_hosts.as_ref() else {
        if opts.strict_host_keys {
            return Err(ConnectionError::UnknownHost {
                host: opts.host.clone(),
            });
        }
        return Ok(());
    };

    let handshake_err = |e: ssh2::Error| ConnectionError::Handshake {
        host: opts.host.clone(),
        message: e.to_string(),
    };

    let mut known_hosts = session.known_hosts().map_err(handshake_err)?;
    if known_hosts_path.exists() {
        known_hosts
            .read_file(known_hosts_path, KnownHostFileKind::OpenSSH)
            .map_err(handshake_err)?;
    }

    let (key, _) = session.host_key().ok_or_else(|| ConnectionError::Handshake {
        host: opts.host.clone(),
        message: "server sent no host key".to_string(),
    })?;

    match known_hosts.check_port(&opts.host, opts.port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::Mismatch => Err(ConnectionError::HostKeyMismatch {
            host: opts.host.clone(),
            known_hosts: known_hosts_path.clone(),
        }),
        CheckResult::NotFound | CheckResult::Failure if opts.strict_host_keys => {
            Err(ConnectionError::UnknownHost {
                host: opts.host.clone(),
            })
        }
        CheckResult::NotFound | CheckResult::Failure => {
            tracing::warn!(host = %opts.host, "host key not found in known_hosts, accepting");
            Ok(())
        }
    }
}

fn authenticate(session: &Session, opts: &ConnectOptions) -> Result<(), ConnectionError> {
    let result = match &opts.credential {
        Credential::Password(password) => session.userauth_password(&opts.user, password),
        Credential::KeyFile { path, passphrase } => {
            session.userauth_pubkey_file(&opts.user, None, path, passphrase.as_deref())
        }
        Credential::Agent => session.userauth_agent(&opts.user),
    };

    result.map_err(|e| ConnectionError::Auth {
        user: opts.user.clone(),
        host: opts.host.clone(),
        message: e.to_string(),
    })
}
