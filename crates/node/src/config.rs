//! YAML configuration of the node daemon.
use std::fs;
use std::io;

use serde::Deserialize;
use serde::Serialize;

use crate::consts::DEFAULT_HASH_BITS;
use crate::consts::DEFAULT_HOST;
use crate::consts::DEFAULT_PORT;
use crate::consts::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::consts::DEFAULT_STABILIZE_INTERVAL;
use crate::consts::DEFAULT_STALE_CONNECTION_SECS;
use crate::consts::MAX_DID_BITS;
use crate::consts::MAX_STALE_CONNECTION_SECS;
use crate::error::Error;
use crate::error::Result;
use crate::logging::LogLevel;
use crate::util::ensure_parent_dir;
use crate::util::expand_home;

fn default_hash_bits() -> u16 {
    DEFAULT_HASH_BITS
}

fn default_stabilize_interval() -> u64 {
    DEFAULT_STABILIZE_INTERVAL
}

fn default_stale_connection_secs() -> i64 {
    DEFAULT_STALE_CONNECTION_SECS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `host:port` of a ring member to join through. A node without one starts a new ring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<String>,
    #[serde(default = "default_hash_bits")]
    pub hash_bits: u16,
    /// Seconds between stabilization rounds.
    #[serde(default = "default_stabilize_interval")]
    pub stabilize_interval: u64,
    #[serde(default = "default_stale_connection_secs")]
    pub stale_connection_secs: i64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            bootstrap: None,
            hash_bits: DEFAULT_HASH_BITS,
            stabilize_interval: DEFAULT_STABILIZE_INTERVAL,
            stale_connection_secs: DEFAULT_STALE_CONNECTION_SECS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    pub fn new(host: &str, port: u16, bootstrap: Option<String>) -> Self {
        Self {
            host: host.to_string(),
            port,
            bootstrap,
            ..Default::default()
        }
    }

    /// Address the node listens on.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject values the node cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DID_BITS).contains(&self.hash_bits) {
            return Err(Error::InvalidConfig(format!(
                "hash_bits {} is out of range 1..={}",
                self.hash_bits, MAX_DID_BITS
            )));
        }
        if !(1..=MAX_STALE_CONNECTION_SECS).contains(&self.stale_connection_secs) {
            return Err(Error::InvalidConfig(format!(
                "stale_connection_secs {} is out of range 1..={}",
                self.stale_connection_secs, MAX_STALE_CONNECTION_SECS
            )));
        }
        if self.stabilize_interval == 0 {
            return Err(Error::InvalidConfig("stabilize_interval must be positive".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("request_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn write_fs<P>(&self, path: P) -> Result<String>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        ensure_parent_dir(&path)?;
        let f =
            fs::File::create(path.as_path()).map_err(|e| Error::CreateFileError(e.to_string()))?;
        let f_writer = io::BufWriter::new(f);
        serde_yaml::to_writer(f_writer, self).map_err(|e| Error::EncodeError(e.to_string()))?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn read_fs<P>(path: P) -> Result<Config>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        tracing::debug!("Read config from: {:?}", path);
        let f = fs::File::open(path).map_err(|e| Error::OpenFileError(e.to_string()))?;
        let f_rdr = io::BufReader::new(f);
        let config: Config =
            serde_yaml::from_reader(f_rdr).map_err(|e| Error::DecodeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
