//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.wa-relay/config.json`) and then
//! overridden from the environment (`WHATSAPP_API_URL`, `ACCESS_TOKEN`, ...).
//! The resulting struct is passed to the gateway once at startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_WHATSAPP_API_URL: &str = "https://graph.facebook.com/v21.0";
const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp Cloud API credentials and endpoint.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Gemini completion service settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Server bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the webhook server (default 3000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; the platform must reach the webhook).
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    3000
}

fn default_server_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// WhatsApp Cloud API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    /// Graph API base, e.g. `https://graph.facebook.com/v21.0`. Overridden by WHATSAPP_API_URL.
    #[serde(default = "default_whatsapp_api_url")]
    pub api_url: String,
    /// Sending phone number id. Overridden by PHONE_NUMBER_ID.
    pub phone_number_id: Option<String>,
    /// Bearer token for outbound calls and media downloads. Overridden by ACCESS_TOKEN.
    pub access_token: Option<String>,
    /// Shared secret for the `hub.verify_token` handshake. Overridden by VERIFY_TOKEN.
    pub verify_token: Option<String>,
}

fn default_whatsapp_api_url() -> String {
    DEFAULT_WHATSAPP_API_URL.to_string()
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_url: default_whatsapp_api_url(),
            phone_number_id: None,
            access_token: None,
            verify_token: None,
        }
    }
}

/// Gemini settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`. Overridden by GEMINI_API_KEY.
    pub api_key: Option<String>,
    /// Service base URL. Overridden by GEMINI_API_URL.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Model id used for `generateContent`. Overridden by GEMINI_MODEL.
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_API_URL.to_string()
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
        }
    }
}

/// Credentials after validation; every field is non-empty.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub phone_number_id: String,
    pub access_token: String,
    pub verify_token: String,
    pub gemini_api_key: String,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Config {
    /// Check that every credential is present. The error lists all missing env names at once.
    pub fn credentials(&self) -> Result<Credentials> {
        let phone_number_id = non_empty(self.whatsapp.phone_number_id.as_ref());
        let access_token = non_empty(self.whatsapp.access_token.as_ref());
        let verify_token = non_empty(self.whatsapp.verify_token.as_ref());
        let gemini_api_key = non_empty(self.gemini.api_key.as_ref());

        let mut missing = Vec::new();
        if phone_number_id.is_none() {
            missing.push("PHONE_NUMBER_ID");
        }
        if access_token.is_none() {
            missing.push("ACCESS_TOKEN");
        }
        if verify_token.is_none() {
            missing.push("VERIFY_TOKEN");
        }
        if gemini_api_key.is_none() {
            missing.push("GEMINI_API_KEY");
        }

        match (phone_number_id, access_token, verify_token, gemini_api_key) {
            (Some(phone_number_id), Some(access_token), Some(verify_token), Some(gemini_api_key)) => {
                Ok(Credentials {
                    phone_number_id,
                    access_token,
                    verify_token,
                    gemini_api_key,
                })
            }
            _ => anyhow::bail!("missing configuration: {}", missing.join(", ")),
        }
    }
}

/// Apply environment overrides using `lookup` (normally `std::env::var`). Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    if let Some(v) = get("BIND") {
        config.server.bind = v;
    }
    if let Some(v) = get("PORT") {
        config.server.port = v
            .parse()
            .with_context(|| format!("parsing PORT value {:?}", v))?;
    }
    if let Some(v) = get("WHATSAPP_API_URL") {
        config.whatsapp.api_url = v;
    }
    if let Some(v) = get("PHONE_NUMBER_ID") {
        config.whatsapp.phone_number_id = Some(v);
    }
    if let Some(v) = get("ACCESS_TOKEN") {
        config.whatsapp.access_token = Some(v);
    }
    if let Some(v) = get("VERIFY_TOKEN") {
        config.whatsapp.verify_token = Some(v);
    }
    if let Some(v) = get("GEMINI_API_KEY") {
        config.gemini.api_key = Some(v);
    }
    if let Some(v) = get("GEMINI_API_URL") {
        config.gemini.base_url = v;
    }
    if let Some(v) = get("GEMINI_MODEL") {
        config.gemini.model = v;
    }
    Ok(())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("WA_RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".wa-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Environment overrides are applied on top. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok((config, path))
}
