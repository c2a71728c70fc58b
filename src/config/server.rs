use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the SQLite database file.
    pub data_dir: PathBuf,
}

impl ServerConfig {
    /// Loads a config file in TOML format. Missing keys fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("edumeet.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.db_path(), PathBuf::from("./data/edumeet.db"));
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:5000".parse().unwrap()
        );
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("edumeet.toml");
        fs::write(&path, "port = 9090\ndata_dir = \"/var/lib/edumeet\"\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/edumeet"));
    }

    #[test]
    fn test_load_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("edumeet.toml");
        fs::write(&path, "port = \"not a number\"").unwrap();

        assert!(matches!(ServerConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            ServerConfig::load(temp.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }
}
