//! Client configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlq_pool::SessionConfig;

use crate::error::Error;
use crate::obfuscation::reveal;

/// Connection settings, as written in a JSON configuration file.
///
/// ```json
/// {
///   "server": "db.internal",
///   "authentication": {
///     "type": "default",
///     "options": { "userName": "app", "password": "data:c2VjcmV0" }
///   },
///   "options": { "database": "orders", "encrypt": true }
/// }
/// ```
///
/// `server`, `userName` and `password` may be given in the `data:<base64>`
/// form; see [`crate::obfuscation`].
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Server address.
    pub server: String,

    /// Login settings.
    #[serde(default)]
    pub authentication: Authentication,

    /// Transport options, passed through to the session untouched.
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Authentication block of a [`Config`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    /// Authentication scheme.
    #[serde(rename = "type", default = "default_scheme")]
    pub scheme: String,

    /// Login credentials.
    #[serde(default)]
    pub options: Credentials,
}

impl Default for Authentication {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            options: Credentials::default(),
        }
    }
}

fn default_scheme() -> String {
    "default".to_string()
}

/// SQL login credentials.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Login name.
    #[serde(default)]
    pub user_name: String,

    /// Login password.
    #[serde(default)]
    pub password: String,
}

impl Config {
    /// Create a configuration for `server` with no credentials.
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a connection string into configuration.
    ///
    /// Supports ADO.NET-style connection strings:
    /// ```text
    /// Server=localhost;Database=mydb;User Id=sa;Password=secret;
    /// ```
    pub fn from_connection_string(conn_str: &str) -> Result<Self, Error> {
        let mut config = Self::default();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "server" | "data source" | "host" => {
                    // host,port or host\instance
                    if let Some((host, port)) = value.split_once(',') {
                        let port: u16 = port
                            .trim()
                            .parse()
                            .map_err(|_| Error::Config(format!("invalid port: {port}")))?;
                        config.server = host.to_string();
                        config.options.insert("port".into(), port.into());
                    } else if let Some((host, instance)) = value.split_once('\\') {
                        config.server = host.to_string();
                        config
                            .options
                            .insert("instanceName".into(), instance.into());
                    } else {
                        config.server = value.to_string();
                    }
                }
                "port" => {
                    let port: u16 = value
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid port: {value}")))?;
                    config.options.insert("port".into(), port.into());
                }
                "database" | "initial catalog" => {
                    config.options.insert("database".into(), value.into());
                }
                "user id" | "uid" | "user" => {
                    config.authentication.options.user_name = value.to_string();
                }
                "password" | "pwd" => {
                    config.authentication.options.password = value.to_string();
                }
                "application name" | "app" => {
                    config.options.insert("appName".into(), value.into());
                }
                "connect timeout" | "connection timeout" => {
                    config
                        .options
                        .insert("connectTimeout".into(), millis(value)?.into());
                }
                "command timeout" => {
                    config
                        .options
                        .insert("requestTimeout".into(), millis(value)?.into());
                }
                "trustservercertificate" | "trust server certificate" => {
                    config
                        .options
                        .insert("trustServerCertificate".into(), flag(value).into());
                }
                "encrypt" => {
                    config.options.insert("encrypt".into(), flag(value).into());
                }
                _ => {
                    tracing::debug!(
                        key = key,
                        value = value,
                        "ignoring unknown connection string option"
                    );
                }
            }
        }

        Ok(config)
    }

    /// Set the login credentials.
    #[must_use]
    pub fn credentials(mut self, user_name: impl Into<String>, password: impl Into<String>) -> Self {
        self.authentication.options = Credentials {
            user_name: user_name.into(),
            password: password.into(),
        };
        self
    }

    /// Set a transport option.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Decode obfuscated fields and produce the settings sessions are opened with.
    pub fn resolve(&self) -> Result<SessionConfig, Error> {
        let server = reveal("server", &self.server)?;
        if server.trim().is_empty() {
            return Err(Error::Config("server must not be empty".into()));
        }

        Ok(SessionConfig {
            server,
            user_name: reveal("userName", &self.authentication.options.user_name)?,
            password: reveal("password", &self.authentication.options.password)?,
            options: self.options.clone(),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("authentication", &self.authentication)
            .field("options", &self.options)
            .finish()
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("scheme", &self.scheme)
            .field("options", &self.options)
            .finish()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn millis(seconds: &str) -> Result<u64, Error> {
    let secs: u64 = seconds
        .parse()
        .map_err(|_| Error::Config(format!("invalid timeout: {seconds}")))?;
    secs.checked_mul(1000)
        .ok_or_else(|| Error::Config(format!("timeout out of range: {seconds}")))
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") || value == "1"
}
