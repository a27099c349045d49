use crate::aggregate::HeaderRow;
use crate::error::FeedbackError;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_DATA_DIR: &str = "database";
const DEFAULT_SMTP_PORT: &str = "465";

/// Where submitted rows are kept
#[derive(Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// JSON-lines sheets under a local directory
    File { dir: PathBuf },
    /// A Google spreadsheet, one tab per category
    Sheets {
        spreadsheet_id: String,
        access_token: String,
    },
}

/// SMTP settings for confirmation mails
#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::File { dir } => f.debug_struct("File").field("dir", dir).finish(),
            StoreConfig::Sheets { spreadsheet_id, .. } => f
                .debug_struct("Sheets")
                .field("spreadsheet_id", spreadsheet_id)
                .finish_non_exhaustive(),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

/// Process configuration, built once at startup and handed to the components that need it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_address: String,
    pub store: StoreConfig,
    pub header_row: HeaderRow,
    pub mail: Option<MailConfig>,
}

impl Config {
    /// Load the configuration from environment variables
    pub fn from_env() -> Result<Self, FeedbackError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration from any key lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the raw value of a variable, if set
    ///
    /// # Returns
    /// * `Result<Config, FeedbackError>` - `Configuration` when a store credential is
    ///   missing or a value does not parse
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FeedbackError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            var(key).ok_or_else(|| FeedbackError::Configuration(format!("{key} is not set")))
        };

        let store = match var("FEEDBACK_STORE").as_deref().unwrap_or("file") {
            "file" => StoreConfig::File {
                dir: PathBuf::from(or_default(var("FEEDBACK_DATA_DIR"), "FEEDBACK_DATA_DIR", DEFAULT_DATA_DIR)),
            },
            "sheets" => StoreConfig::Sheets {
                spreadsheet_id: required("SHEETS_SPREADSHEET_ID")?,
                access_token: required("SHEETS_ACCESS_TOKEN")?,
            },
            other => {
                return Err(FeedbackError::Configuration(format!(
                    "FEEDBACK_STORE must be 'file' or 'sheets', got '{other}'"
                )));
            }
        };

        let header_row = if parse_value::<bool>(var("FEEDBACK_HEADER_ROW"), "FEEDBACK_HEADER_ROW", "false")? {
            HeaderRow::Present
        } else {
            HeaderRow::Absent
        };

        let mail = match var("SMTP_HOST") {
            Some(host) => Some(MailConfig {
                port: parse_value(var("SMTP_PORT"), "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                username: required("SMTP_USERNAME")?,
                password: required("SMTP_PASSWORD")?,
                from: required("MAIL_FROM")?,
                host,
            }),
            None => {
                log::info!("SMTP_HOST not set, confirmation mails disabled");
                None
            }
        };

        Ok(Config {
            bind_address: or_default(var("FEEDBACK_BIND"), "FEEDBACK_BIND", DEFAULT_BIND),
            store,
            header_row,
            mail,
        })
    }
}

fn or_default(value: Option<String>, key: &str, default: &str) -> String {
    value.unwrap_or_else(|| {
        log::info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_value<T: FromStr>(value: Option<String>, key: &str, default: &str) -> Result<T, FeedbackError>
where
    T::Err: Display,
{
    or_default(value, key, default)
        .parse()
        .map_err(|e| FeedbackError::Configuration(format!("Invalid {key} value: {e}")))
}
