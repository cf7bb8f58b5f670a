use std::sync::Arc;

use shelfshot_lib::settings::HttpSettings;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::error::ScrapeError;

/// HTTP behaviour shared by the search adapters and the downloader.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub search_timeout: Duration,
    pub download_timeout: Duration,
    pub politeness_delay: Duration,
    pub retry_pause: Duration,
    pub max_redirects: usize,
    pub min_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::from(&HttpSettings::default())
    }
}

impl From<&HttpSettings> for HttpConfig {
    fn from(s: &HttpSettings) -> Self {
        Self {
            user_agent: s.user_agent.clone(),
            search_timeout: Duration::from_secs(s.search_timeout_secs),
            download_timeout: Duration::from_secs(s.download_timeout_secs),
            politeness_delay: Duration::from_millis(s.politeness_delay_ms),
            retry_pause: Duration::from_millis(s.retry_pause_ms),
            max_redirects: s.max_redirects,
            min_bytes: s.min_bytes,
        }
    }
}

impl HttpConfig {
    /// No delays between requests; used by tests and offline runs.
    pub fn without_delays(mut self) -> Self {
        self.politeness_delay = Duration::ZERO;
        self.retry_pause = Duration::ZERO;
        self
    }
}

/// Build a client with the configured user agent, redirect limit and
/// `timeout`. Search and download clients differ only in the timeout.
pub fn build_client(config: &HttpConfig, timeout: Duration) -> Result<reqwest::Client, ScrapeError> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()?;
    Ok(client)
}

/// Spaces out external requests: each [`Throttle::wait`] returns no sooner
/// than `interval` after the previous one.
///
/// Cloning shares the clock, so every adapter and the downloader draw from
/// one schedule.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_follows_settings() {
        let settings = HttpSettings {
            search_timeout_secs: 7,
            politeness_delay_ms: 250,
            ..HttpSettings::default()
        };
        let config = HttpConfig::from(&settings);
        assert_eq!(config.search_timeout, Duration::from_secs(7));
        assert_eq!(config.download_timeout, Duration::from_secs(30));
        assert_eq!(config.politeness_delay, Duration::from_millis(250));
        assert_eq!(config.max_redirects, 1);
        assert_eq!(config.min_bytes, 10 * 1024);
    }

    #[test]
    fn builds_a_client() {
        let config = HttpConfig::default();
        assert!(build_client(&config, config.search_timeout).is_ok());
    }

    #[tokio::test]
    async fn throttle_spaces_requests() {
        let throttle = Throttle::new(Duration::from_millis(40));
        let start = Instant::now();
        throttle.wait().await;
        throttle.clone().wait().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn zero_interval_never_sleeps() {
        let throttle = Throttle::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            throttle.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
