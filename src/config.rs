//! On-disk server configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration, loaded from a TOML file.
///
/// Keys missing from the file take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Address to listen on.
    pub ip: String,
    pub port: u16,
    /// Protocol number advertised in the server list. `-1` makes every
    /// client show the server as incompatible.
    pub protocol: i32,
    /// Version name shown next to the ping bars.
    pub version: String,
    pub online: i32,
    pub max_online: i32,
    pub motd: String,
    /// Sent to every client that tries to log in.
    pub kick_message: String,
    pub kick_message_banned: String,
    pub kick_message_not_whitelisted: String,
    /// PNG shown as the server icon. Must be 64x64.
    pub favicon: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_owned(),
            port: 25566,
            protocol: -1,
            version: "MaintenanceServer".to_owned(),
            online: 0,
            max_online: 0,
            motd: "A Maintenance Server!".to_owned(),
            kick_message: "This is a Maintenance Server you silly goose!".to_owned(),
            kick_message_banned: "You are banned from this server".to_owned(),
            kick_message_not_whitelisted: "You are not whitelisted!".to_owned(),
            favicon: PathBuf::from("server-icon.png"),
        }
    }
}

impl ServerConfig {
    /// Loads the configuration at `path`.
    ///
    /// If the file does not exist, the defaults are written there so the
    /// operator has something to edit. A key with a value of the wrong
    /// type is replaced by its default, and keys missing from the file are
    /// written back to it. A file that is not valid TOML at all is left
    /// alone and the defaults are used. Failing to write is never fatal.
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => tracing::info!("Wrote default configuration to {}", path.display()),
                Err(e) => tracing::warn!("Failed to save {}: {e:#}", path.display()),
            }
            return Ok(config);
        }

        let contents = fs_err::read_to_string(path)?;
        let table = match contents.parse::<toml::Table>() {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(
                    "Failed to load {}, using the default configuration: {e}",
                    path.display()
                );
                return Ok(Self::default());
            }
        };

        let (config, repaired) = Self::merge_with_defaults(&table)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        if repaired {
            match config.save(path) {
                Ok(()) => tracing::info!("Updated {} with default values", path.display()),
                Err(e) => tracing::warn!("Failed to save {}: {e:#}", path.display()),
            }
        }
        Ok(config)
    }

    /// Overlays the keys in `file` on the defaults one at a time, skipping
    /// any value that does not fit its key. Also reports whether the result
    /// differs from what the file holds.
    fn merge_with_defaults(file: &toml::Table) -> anyhow::Result<(Self, bool)> {
        let mut merged = toml::Table::try_from(Self::default())?;
        let mut repaired = false;

        for key in merged.keys().cloned().collect::<Vec<_>>() {
            let Some(value) = file.get(&key) else {
                repaired = true;
                continue;
            };

            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value.clone());
            match candidate.clone().try_into::<Self>() {
                Ok(_) => merged = candidate,
                Err(e) => {
                    tracing::warn!("Invalid value for `{key}`, using the default: {e}");
                    repaired = true;
                }
            }
        }

        Ok((merged.try_into()?, repaired))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs_err::write(path, contents)?;
        Ok(())
    }

    /// Host and port for the listening socket.
    pub fn bind_address(&self) -> (&str, u16) {
        (&self.ip, self.port)
    }
}
