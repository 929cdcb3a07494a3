use std::path::PathBuf;
use std::time::Duration;

use super::args::Cli;
use crate::common::config::{Config, OutputFormat};
use crate::remote::sftp::default_known_hosts;
use crate::remote::{ConnectOptions, Credential};

/// Command line merged over the config file
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub connect: ConnectOptions,
    pub directory: String,
    pub age_days: f64,
    pub exclude: Option<String>,
    pub include: Option<String>,
    pub list_only: bool,
    pub format: OutputFormat,
    pub detailed: bool,
}

impl RunSettings {
    /// Flags win over config values, config values over built-in defaults
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        let user = cli.user.clone().unwrap_or_else(|| config.user.clone());

        let mut connect = ConnectOptions::new(cli.host.clone(), user, resolve_credential(cli, config));
        connect.port = cli.port.unwrap_or(config.port);
        connect.timeout = match cli.timeout.unwrap_or(config.timeout_secs) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        connect.known_hosts = config.known_hosts.clone().or_else(default_known_hosts);
        connect.strict_host_keys = cli.strict_host_keys || config.strict_host_keys;

        Self {
            connect,
            directory: cli
                .directory
                .clone()
                .unwrap_or_else(|| config.directory.clone()),
            age_days: cli.age.unwrap_or(config.age_days),
            exclude: cli.exclude.clone().or_else(|| config.exclude.clone()),
            include: cli.include.clone().or_else(|| config.include.clone()),
            list_only: cli.list_only,
            format: cli.format.unwrap_or(config.output_format),
            detailed: cli.detailed,
        }
    }
}

/// Pick how to authenticate.
///
/// An explicit key or `--agent` beats a password; with an identity file a
/// given password unlocks the key. With nothing given, ssh-agent is tried.
fn resolve_credential(cli: &Cli, config: &Config) -> Credential {
    let key_file = |path: PathBuf| Credential::KeyFile {
        path,
        passphrase: cli.password.clone(),
    };

    if let Some(path) = cli.identity.clone() {
        return key_file(path);
    }
    if cli.agent {
        return Credential::Agent;
    }
    if let Some(password) = cli.password.clone() {
        return Credential::Password(password);
    }
    match config.identity_file.clone() {
        Some(path) => key_file(path),
        None => Credential::Agent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["sftpsweep"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_config() {
        let settings = RunSettings::resolve(&parse(&["-h", "nas"]), &Config::default());
        assert_eq!(settings.connect.user, "anonymous");
        assert_eq!(settings.connect.port, 22);
        assert_eq!(settings.directory, ".");
        assert_eq!(settings.age_days, 0.0);
        assert!(settings.connect.timeout.is_none());
        assert!(!settings.list_only);
        assert_eq!(settings.format, OutputFormat::Human);
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            user: "backup".to_string(),
            directory: "/srv".to_string(),
            age_days: 30.0,
            exclude: Some("^keep".to_string()),
            timeout_secs: 10,
            ..Config::default()
        };
        let settings = RunSettings::resolve(
            &parse(&["-h", "nas", "-u", "ops", "-t", "7", "--timeout", "0"]),
            &config,
        );
        assert_eq!(settings.connect.user, "ops");
        assert_eq!(settings.age_days, 7.0);
        assert_eq!(settings.directory, "/srv");
        assert_eq!(settings.exclude.as_deref(), Some("^keep"));
        assert!(settings.connect.timeout.is_none());
    }

    #[test]
    fn test_credential_precedence() {
        let config = Config {
            identity_file: Some(PathBuf::from("/cfg/key")),
            ..Config::default()
        };

        let s = RunSettings::resolve(&parse(&["-h", "nas", "-p", "pw"]), &config);
        assert!(matches!(s.connect.credential, Credential::Password(ref p) if p == "pw"));

        let s = RunSettings::resolve(&parse(&["-h", "nas", "-i", "/my/key", "-p", "pw"]), &config);
        match s.connect.credential {
            Credential::KeyFile { path, passphrase } => {
                assert_eq!(path, PathBuf::from("/my/key"));
                assert_eq!(passphrase.as_deref(), Some("pw"));
            }
            other => panic!("unexpected credential {:?}", other),
        }

        let s = RunSettings::resolve(&parse(&["-h", "nas", "--agent"]), &config);
        assert!(matches!(s.connect.credential, Credential::Agent));
    }
}
