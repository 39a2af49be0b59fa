//! Configuration management for the IR-Flow client.
//!
//! A [`Config`] is built from exactly one source: an explicit JSON mapping, an
//! INI file with an `[IRFlowAPI]` section, or environment variables. Values are
//! validated once and the result is immutable for the life of the client.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;

use ini::{Ini, ParseOption};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{IrFlowError, Result};

/// Section of the configuration file holding the client settings.
pub const CONFIG_SECTION: &str = "IRFlowAPI";

/// Protocol used when none is configured.
pub const DEFAULT_PROTOCOL: &str = "https";

/// Verbosity used when none is configured.
pub const DEFAULT_VERBOSE: u8 = 1;

/// Keys that every configuration source must provide, in check order.
const REQUIRED_KEYS: [&str; 3] = ["address", "api_user", "api_key"];

/// Configuration for connecting to an IR-Flow server.
///
/// The API key is kept private and redacted from `Debug` output and from
/// [`Config::settings_dump`].
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Server FQDN or IP address, without scheme or trailing slash.
    pub address: String,

    /// `http` or `https`.
    pub protocol: String,

    /// IR-Flow API user.
    pub api_user: String,

    /// API key of `api_user`. Never logged.
    api_key: String,

    /// Trace every request and response through the client's diagnostic sink.
    pub debug: bool,

    /// Trace detail: 1 adds HTTP status, 2 adds the response body.
    pub verbose: u8,

    /// Verify the server's TLS certificate.
    pub verify_tls: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("protocol", &self.protocol)
            .field("api_user", &self.api_user)
            .field("api_key", &"[REDACTED]")
            .field("debug", &self.debug)
            .field("verbose", &self.verbose)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

impl Config {
    /// Creates a configuration from its required values, with defaults for the rest.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::InvalidValue` for empty values and
    /// `IrFlowError::Config` when the address does not form a valid URL.
    pub fn new(
        address: impl Into<String>,
        api_user: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        Config {
            address: address.into(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            api_user: api_user.into(),
            api_key: api_key.into(),
            debug: false,
            verbose: DEFAULT_VERBOSE,
            verify_tls: false,
        }
        .validated()
    }

    /// Sets the protocol (`http` or `https`).
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Result<Self> {
        self.protocol = protocol.into();
        self.validated()
    }

    /// Enables or disables debug tracing.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the trace verbosity.
    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enables or disables TLS certificate verification.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Loads configuration from one of two sources.
    ///
    /// When both are given the mapping wins and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::Config` if neither source is given, otherwise
    /// whatever the chosen source reports.
    pub fn load(mapping: Option<&Value>, file: Option<&Path>) -> Result<Self> {
        match (mapping, file) {
            (Some(mapping), Some(file)) => {
                tracing::warn!(
                    file = %file.display(),
                    "Both a configuration mapping and a config file were given, using the mapping"
                );
                Self::from_mapping(mapping)
            }
            (Some(mapping), None) => Self::from_mapping(mapping),
            (None, Some(file)) => Self::from_file(file),
            (None, None) => Err(IrFlowError::invalid_config(
                "missing configuration: pass either a configuration mapping or a config file",
            )),
        }
    }

    /// Builds configuration from an explicit JSON mapping.
    ///
    /// Required keys: `address`, `api_user`, `api_key` (non-empty strings).
    /// Optional keys: `protocol`, `debug`, `verbose`, `verify_tls`.
    ///
    /// # Errors
    ///
    /// - `IrFlowError::MissingKey` naming the first absent required key.
    /// - `IrFlowError::InvalidValue` when any value has the wrong type.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = Config::from_mapping(&serde_json::json!({
    ///     "address": "irflow.example.com",
    ///     "api_user": "api_user",
    ///     "api_key": "0123456789abcdef",
    /// }))?;
    /// ```
    pub fn from_mapping(mapping: &Value) -> Result<Self> {
        let map = mapping.as_object().ok_or_else(IrFlowError::wrong_value)?;

        if let Some(key) = REQUIRED_KEYS.iter().find(|key| !map.contains_key(**key)) {
            return Err(IrFlowError::missing_key(*key));
        }

        let protocol = match map.get("protocol") {
            None | Some(Value::Null) => DEFAULT_PROTOCOL.to_string(),
            Some(Value::String(s)) if s.trim().is_empty() => DEFAULT_PROTOCOL.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(IrFlowError::wrong_value()),
        };

        Config {
            address: Self::mapping_str(map, "address")?,
            protocol,
            api_user: Self::mapping_str(map, "api_user")?,
            api_key: Self::mapping_str(map, "api_key")?,
            debug: Self::mapping_bool(map, "debug")?,
            verbose: Self::mapping_verbose(map)?,
            verify_tls: Self::mapping_bool(map, "verify_tls")?,
        }
        .validated()
    }

    /// Loads configuration from the `[IRFlowAPI]` section of an INI file.
    ///
    /// # Errors
    ///
    /// - `IrFlowError::MissingSection` if the file or section does not exist.
    /// - `IrFlowError::MissingFileKeys` listing every absent required key; each
    ///   one is also logged as it is found.
    /// - `IrFlowError::InvalidValue` for unparseable optional values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let missing_section = || IrFlowError::MissingSection {
            path: path.to_path_buf(),
            section: CONFIG_SECTION.to_string(),
        };

        // An unreadable file has no sections.
        if !path.is_file() {
            return Err(missing_section());
        }

        // Values are taken literally: backslashes and quotes are part of the credential.
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_file_opt(path, options)?;

        let section = ini
            .iter()
            .find(|(name, _)| name.is_some_and(|n| n.eq_ignore_ascii_case(CONFIG_SECTION)))
            .map(|(_, properties)| properties)
            .ok_or_else(missing_section)?;

        let values: HashMap<String, String> = section
            .iter()
            .map(|(key, value)| (key.to_lowercase(), value.to_string()))
            .collect();

        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|key| !values.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        for key in &missing {
            tracing::error!(
                file = %path.display(),
                "Configuration file does not contain the \"{}\" option in the [{}] section",
                key,
                CONFIG_SECTION
            );
        }
        if !missing.is_empty() {
            return Err(IrFlowError::MissingFileKeys {
                path: path.to_path_buf(),
                keys: missing,
            });
        }

        Self::from_string_values(&values, |key| key.to_string())
    }

    /// Loads configuration from `IRFLOW_*` environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `IRFLOW_ADDRESS`
    /// - `IRFLOW_API_USER`
    /// - `IRFLOW_API_KEY`
    ///
    /// Optional: `IRFLOW_PROTOCOL`, `IRFLOW_DEBUG`, `IRFLOW_VERBOSE`,
    /// `IRFLOW_VERIFY_TLS`.
    ///
    /// # Errors
    ///
    /// Returns `IrFlowError::MissingKey` naming the first missing variable.
    pub fn from_env() -> Result<Self> {
        let env_name = |key: &str| format!("IRFLOW_{}", key.to_uppercase());

        let mut values = HashMap::new();
        for key in ["protocol", "debug", "verbose", "verify_tls"]
            .into_iter()
            .chain(REQUIRED_KEYS)
        {
            if let Ok(value) = env::var(env_name(key)) {
                if !value.trim().is_empty() {
                    values.insert(key.to_string(), value);
                }
            }
        }

        if let Some(key) = REQUIRED_KEYS.iter().find(|key| !values.contains_key(**key)) {
            return Err(IrFlowError::missing_key(env_name(key)));
        }

        Self::from_string_values(&values, env_name)
    }

    /// Returns the API key. Use only to authenticate or to sanitize messages.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the server root, e.g. `https://irflow.example.com`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.address)
    }

    /// Returns the settings as printable lines, with the API key redacted.
    pub fn settings_dump(&self) -> Vec<String> {
        vec![
            "========== IRFlowAPI Created ==========".to_string(),
            "Configuration Settings:".to_string(),
            format!("\tAddress: \"{}\"", self.address),
            format!("\tAPI_User: \"{}\"", self.api_user),
            "\tAPI_Key: \"[REDACTED]\"".to_string(),
            format!("\tProtocol: \"{}\"", self.protocol),
            format!("\tDebug: \"{}\"", self.debug),
            format!("\tVerbose: \"{}\"", self.verbose),
            format!("\tVerify_TLS: \"{}\"", self.verify_tls),
        ]
    }

    /// Builds configuration from string values (file or environment).
    ///
    /// `name` maps a key to the name shown in error messages.
    fn from_string_values(
        values: &HashMap<String, String>,
        name: impl Fn(&str) -> String,
    ) -> Result<Self> {
        let required = |key: &str| {
            values
                .get(key)
                .cloned()
                .ok_or_else(|| IrFlowError::missing_key(name(key)))
        };
        let flag = |key: &str| match values.get(key) {
            Some(value) => Self::parse_bool(&name(key), value),
            None => Ok(false),
        };

        let verbose = match values.get("verbose") {
            Some(value) => value.trim().parse::<u8>().map_err(|_| {
                IrFlowError::InvalidValue(format!(
                    "{} must be a small non-negative integer, got {:?}",
                    name("verbose"),
                    value
                ))
            })?,
            None => DEFAULT_VERBOSE,
        };

        Config {
            address: required("address")?,
            protocol: values
                .get("protocol")
                .filter(|p| !p.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string()),
            api_user: required("api_user")?,
            api_key: required("api_key")?,
            debug: flag("debug")?,
            verbose,
            verify_tls: flag("verify_tls")?,
        }
        .validated()
    }

    /// Parses an INI-style boolean.
    fn parse_bool(name: &str, value: &str) -> Result<bool> {
        match value.trim().to_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(IrFlowError::InvalidValue(format!(
                "{} must be a boolean, got {:?}",
                name, value
            ))),
        }
    }

    /// Reads a required non-empty string from a mapping.
    fn mapping_str(map: &Map<String, Value>, key: &str) -> Result<String> {
        match map.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            Some(_) => Err(IrFlowError::wrong_value()),
            None => Err(IrFlowError::missing_key(key)),
        }
    }

    /// Reads an optional flag from a mapping, defaulting to false.
    fn mapping_bool(map: &Map<String, Value>, key: &str) -> Result<bool> {
        match map.get(key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => {
                Self::parse_bool(key, s).map_err(|_| IrFlowError::wrong_value())
            }
            Some(_) => Err(IrFlowError::wrong_value()),
        }
    }

    /// Reads the optional verbosity from a mapping.
    fn mapping_verbose(map: &Map<String, Value>) -> Result<u8> {
        match map.get("verbose") {
            None | Some(Value::Null) => Ok(DEFAULT_VERBOSE),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(IrFlowError::wrong_value),
            Some(Value::String(s)) => s.trim().parse().map_err(|_| IrFlowError::wrong_value()),
            Some(_) => Err(IrFlowError::wrong_value()),
        }
    }

    /// Normalizes and validates a freshly assembled configuration.
    fn validated(mut self) -> Result<Self> {
        self.address = self.address.trim().trim_end_matches('/').to_string();
        self.protocol = self.protocol.trim().to_lowercase();
        self.api_user = self.api_user.trim().to_string();
        self.api_key = self.api_key.trim().to_string();

        if self.address.is_empty() || self.api_user.is_empty() || self.api_key.is_empty() {
            return Err(IrFlowError::wrong_value());
        }

        if self.protocol != "http" && self.protocol != "https" {
            return Err(IrFlowError::invalid_config(format!(
                "protocol must be http or https, got {:?}",
                self.protocol
            )));
        }

        Url::parse(&self.base_url()).map_err(|e| {
            IrFlowError::invalid_config(format!("invalid address {:?}: {}", self.address, e))
        })?;

        Ok(self)
    }
}
