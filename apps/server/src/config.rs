// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use ifc_report_processing::DEFAULT_FILE_NAME;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Maximum upload size in MB (per request).
    pub max_file_size_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Number of worker threads for parallel parsing.
    pub worker_threads: usize,
    /// Idle time after which a session is dropped.
    pub session_ttl_secs: u64,
    /// Suggested name of the exported workbook.
    pub export_file_name: String,
    /// Columns selected by the `preset` action when none are given.
    pub preset_columns: Vec<String>,
    /// Default page size for table previews.
    pub preview_page_size: usize,
    /// Allowed CORS origins (comma-separated, or "*" for any).
    pub cors_origins: Vec<String>,
    /// Emit JSON log lines instead of the pretty format (`LOG_FORMAT=json`).
    pub json_logs: bool,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn env_list(name: &str, default: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_else(|_| default.into())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_json_format(format: &str) -> bool {
    format.trim().eq_ignore_ascii_case("json")
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 8080),
            max_file_size_mb: env_or("MAX_FILE_SIZE_MB", 500),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 300),
            worker_threads: env_or("WORKER_THREADS", num_cpus::get()),
            session_ttl_secs: env_or("SESSION_TTL_SECS", 3600),
            export_file_name: std::env::var("EXPORT_FILE_NAME")
                .ok()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILE_NAME.into()),
            preset_columns: env_list("PRESET_COLUMNS", "GUID,Name,Type"),
            preview_page_size: env_or("PREVIEW_PAGE_SIZE", 500),
            cors_origins: env_list("CORS_ORIGINS", "*"),
            json_logs: std::env::var("LOG_FORMAT").is_ok_and(|format| is_json_format(&format)),
        }
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
