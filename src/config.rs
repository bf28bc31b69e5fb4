use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub push_url: String,
    pub http_timeout_secs: u64,
    /// Interval of the "last updated" refresh while real-time mode is off
    pub poll_secs: u64,
    pub toast_secs: u64,
    pub modal_secs: u64,
    pub output_dir: String,
    pub history_days: u32,
    pub connect_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000".to_string(),
            push_url: "ws://127.0.0.1:5000/live".to_string(),
            http_timeout_secs: 10,
            poll_secs: 30,
            toast_secs: 3,
            modal_secs: 3,
            output_dir: "out/pages".to_string(),
            history_days: 30,
            connect_retries: 3,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_base: std::env::var("API_BASE").unwrap_or(d.api_base),
            push_url: std::env::var("PUSH_URL").unwrap_or(d.push_url),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.http_timeout_secs),
            poll_secs: std::env::var("POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.poll_secs),
            toast_secs: std::env::var("TOAST_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.toast_secs),
            modal_secs: std::env::var("MODAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.modal_secs),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(d.output_dir),
            history_days: std::env::var("HISTORY_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.history_days),
            connect_retries: std::env::var("CONNECT_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(d.connect_retries),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }

    pub fn toast_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.toast_secs as i64)
    }

    pub fn modal_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.modal_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals_never_zero() {
        let cfg = Config {
            poll_secs: 0,
            http_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.http_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_defaults_match_page_timings() {
        let cfg = Config::default();
        assert_eq!(cfg.poll_secs, 30);
        assert_eq!(cfg.toast_ttl(), chrono::Duration::seconds(3));
        assert_eq!(cfg.modal_ttl(), chrono::Duration::seconds(3));
    }
}
