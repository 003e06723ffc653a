//! Application configuration.
//!
//! Runtime settings come from environment variables with sensible defaults;
//! the metric catalog itself lives in a separate JSON file (see
//! [`crate::models::catalog`]).

/// Runtime configuration shared by the service binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address to bind the listener to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Path to the catalog JSON file.
    pub catalog_path: String,
}

impl AppConfig {
    /// Loads configuration from the environment.
    ///
    /// Recognized variables: `HOST`, `SERVER_PORT`, `CATALOG_PATH`.
    pub fn load(default_port: u16) -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_port),
            catalog_path: std::env::var("CATALOG_PATH")
                .unwrap_or_else(|_| "./catalog.json".to_string()),
        }
    }

    /// Returns the `host:port` pair for the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
