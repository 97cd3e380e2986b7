//! Application configuration loaded from environment variables.
//!
//! Secrets arrive as environment variables (injected by the deployment), so
//! they are read once at startup and kept in memory.

use std::env;

/// Which datastore backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatastoreKind {
    Firestore,
    Memory,
}

impl std::str::FromStr for DatastoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("DATASTORE", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (allowed CORS origin)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Datastore backend
    pub datastore: DatastoreKind,
    /// External user IDs allowed to manage the catalog and the ledger
    pub admin_user_ids: Vec<String>,
    /// Points credited for submitting a waste report
    pub report_points: i64,
    /// Points credited to the collector of a report
    pub collection_points: i64,
    /// Points credited on verified event attendance (0 disables)
    pub attendance_points: i64,
    /// AI proxy upstream URL
    pub ai_endpoint: Option<String>,

    // --- Secrets ---
    /// HS256 key the identity provider signs session tokens with (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// Identity-provider webhook secret (`whsec_...`)
    pub identity_webhook_secret: String,
    /// AI proxy API key
    pub ai_api_key: Option<String>,
}

impl Config {
    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            datastore: DatastoreKind::Memory,
            admin_user_ids: vec!["user_admin".to_string()],
            report_points: 10,
            collection_points: 10,
            attendance_points: 0,
            ai_endpoint: None,
            session_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            // base64("test_webhook_secret_bytes")
            identity_webhook_secret: "whsec_dGVzdF93ZWJob29rX3NlY3JldF9ieXRlcw==".to_string(),
            ai_api_key: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            datastore: env::var("DATASTORE")
                .unwrap_or_else(|_| "firestore".to_string())
                .parse()?,
            admin_user_ids: env::var("ADMIN_USER_IDS")
                .map(|v| parse_id_list(&v))
                .unwrap_or_default(),
            report_points: points_var("REPORT_POINTS", 10)?,
            collection_points: points_var("COLLECTION_POINTS", 10)?,
            attendance_points: points_var("ATTENDANCE_POINTS", 0)?,
            ai_endpoint: env::var("AI_ENDPOINT").ok().filter(|v| !v.trim().is_empty()),

            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
            identity_webhook_secret: env::var("IDENTITY_WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("IDENTITY_WEBHOOK_SECRET"))?,
            ai_api_key: env::var("AI_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    /// Whether the given user may manage the catalog and the ledger.
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_user_ids.iter().any(|id| id == user_id)
    }
}

fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn points_var(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<i64>() {
            Ok(v) if v >= 0 => Ok(v),
            _ => Err(ConfigError::Invalid(name, raw)),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
