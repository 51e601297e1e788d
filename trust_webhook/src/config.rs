//! Command line and environment configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, ValueEnum};

use crate::password_hash::HashPolynomial;
use crate::{Error, Result};

/// Mutating admission webhook for trust.cert-manager.io Bundles
#[derive(Parser, Debug)]
#[command(name = "trust-webhook", version, about, long_about = None)]
pub struct Config {
    /// Print the Bundle CustomResourceDefinition and exit
    #[arg(long)]
    pub crd: bool,

    #[command(flatten)]
    pub server: ServerConfig,

    /// CRC-32 polynomial used to derive password hashes
    ///
    /// `legacy` reproduces the hashes written by existing installations.
    #[arg(
        long,
        env = "WEBHOOK_PASSWORD_HASH_POLYNOMIAL",
        value_enum,
        default_value_t = HashPolynomial::Legacy
    )]
    pub password_hash_polynomial: HashPolynomial,

    /// Log output format
    #[arg(long, env = "WEBHOOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Listener settings
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "WEBHOOK_LISTEN_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen_address: IpAddr,

    /// Port to listen on
    #[arg(long, env = "WEBHOOK_PORT", default_value_t = 6443)]
    pub port: u16,

    /// PEM certificate served to the API server; plain http when unset
    #[arg(long, env = "WEBHOOK_TLS_CERT_FILE", requires = "tls_private_key_file")]
    pub tls_cert_file: Option<PathBuf>,

    /// PEM private key matching `--tls-cert-file`
    #[arg(long, env = "WEBHOOK_TLS_PRIVATE_KEY_FILE", requires = "tls_cert_file")]
    pub tls_private_key_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 6443,
            tls_cert_file: None,
            tls_private_key_file: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }

    /// Certificate and key paths, if TLS is configured
    pub fn tls_paths(&self) -> Result<Option<(&Path, &Path)>> {
        match (&self.tls_cert_file, &self.tls_private_key_file) {
            (Some(cert), Some(key)) => Ok(Some((cert.as_path(), key.as_path()))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::TlsError(
                "certificate given without a private key".to_owned(),
            )),
            (None, Some(_)) => Err(Error::TlsError(
                "private key given without a certificate".to_owned(),
            )),
        }
    }
}
