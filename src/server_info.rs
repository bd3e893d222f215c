//! What the server tells clients about itself.

use crate::{config::ServerConfig, favicon::Favicon};
use serde::{Deserialize, Serialize};

/// Body of the status reply, as shown in the client's server list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: Version,
    pub players: Players,
    pub description: TextComponent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub max: i32,
    pub online: i32,
}

/// A plain chat component, `{"text": ...}`. Used for the MOTD and for
/// kick messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextComponent {
    pub text: String,
}

impl TextComponent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Immutable snapshot of everything the protocol layer reads from the
/// configuration.
///
/// The status JSON is serialized once here. The configuration is never
/// reloaded while the server runs, so it never goes stale.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    version_name: String,
    protocol: i32,
    online: i32,
    max_online: i32,
    motd: String,
    kick_message: String,
    kick_message_banned: String,
    kick_message_not_whitelisted: String,
    favicon: Option<Favicon>,
    status_json: String,
}

impl ServerInfo {
    pub fn new(config: &ServerConfig, favicon: Option<Favicon>) -> serde_json::Result<Self> {
        let mut info = Self {
            version_name: config.version.clone(),
            protocol: config.protocol,
            online: config.online,
            max_online: config.max_online,
            motd: config.motd.clone(),
            kick_message: config.kick_message.clone(),
            kick_message_banned: config.kick_message_banned.clone(),
            kick_message_not_whitelisted: config.kick_message_not_whitelisted.clone(),
            favicon,
            status_json: String::new(),
        };
        info.status_json = serde_json::to_string(&info.status_response())?;
        Ok(info)
    }

    /// Builds the status reply from this snapshot.
    pub fn status_response(&self) -> StatusResponse {
        StatusResponse {
            version: Version {
                name: self.version_name.clone(),
                protocol: self.protocol,
            },
            players: Players {
                max: self.max_online,
                online: self.online,
            },
            description: TextComponent::new(self.motd.as_str()),
            favicon: self
                .favicon
                .as_ref()
                .map(|favicon| favicon.data_uri().to_owned()),
        }
    }

    /// [`Self::status_response`], serialized.
    pub fn status_json(&self) -> &str {
        &self.status_json
    }

    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    pub fn protocol(&self) -> i32 {
        self.protocol
    }

    pub fn online(&self) -> i32 {
        self.online
    }

    pub fn max_online(&self) -> i32 {
        self.max_online
    }

    pub fn motd(&self) -> &str {
        &self.motd
    }

    /// Reason given to every rejected login.
    pub fn kick_message(&self) -> &str {
        &self.kick_message
    }

    // Ban and whitelist enforcement do not exist; these are configuration only.
    pub fn kick_message_banned(&self) -> &str {
        &self.kick_message_banned
    }

    pub fn kick_message_not_whitelisted(&self) -> &str {
        &self.kick_message_not_whitelisted
    }

    pub fn favicon(&self) -> Option<&Favicon> {
        self.favicon.as_ref()
    }
}
