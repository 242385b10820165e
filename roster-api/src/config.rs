//! API Configuration Module
//!
//! CORS, upload limits and store backend selection. Loaded from environment
//! variables with development-friendly defaults.

use std::str::FromStr;

/// Default upload size limit: 5 MiB.
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;

// ============================================================================
// STORE BACKEND
// ============================================================================

/// Which `RosterStore` implementation the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local store; data is lost on restart.
    #[default]
    Memory,
    /// Postgres through the deadpool connection pool.
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            other => Err(format!("Unknown store backend: {}", other)),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins. Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Upload and Storage Configuration
    // ========================================================================
    /// Maximum accepted multipart body for list uploads, in bytes.
    pub upload_max_bytes: usize,

    /// Store implementation to run on.
    pub store_backend: StoreBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            store_backend: StoreBackend::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ROSTER_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `ROSTER_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `ROSTER_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `ROSTER_UPLOAD_MAX_BYTES`: Upload size limit (default: 5 MiB)
    /// - `ROSTER_STORE`: "memory" or "postgres" (default: memory)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("ROSTER_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("ROSTER_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("ROSTER_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let upload_max_bytes = std::env::var("ROSTER_UPLOAD_MAX_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_UPLOAD_MAX_BYTES);

        let store_backend = match std::env::var("ROSTER_STORE") {
            Ok(value) => value.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Falling back to in-memory store");
                StoreBackend::Memory
            }),
            Err(_) => StoreBackend::default(),
        };

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            upload_max_bytes,
            store_backend,
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // *.example.com
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern))
                        || origin_domain == pattern;
                }
            }
            false
        })
    }
}
