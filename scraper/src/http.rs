use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use std::thread;
use std::time::Duration;
use tracing::warn;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; litsim/0.1; +https://github.com/litsim)";
const TRIES: u32 = 3;

/// Blocking HTTP client shared by both collectors for the lifetime of a run.
/// One persistent session carries the identifying User-Agent and, when the
/// `ARXIV_COOKIE` env var is set (`key=value` pairs separated by `;`), the
/// session cookies.
pub struct HttpClient {
    client: Client,
    base_sleep: Duration,
}

fn cookie_header(raw: &str) -> Option<HeaderValue> {
    let pairs: Vec<String> = raw
        .split(';')
        .filter_map(|part| {
            let part = part.trim();
            part.contains('=').then(|| part.to_string())
        })
        .collect();
    if pairs.is_empty() {
        return None;
    }
    HeaderValue::from_str(&pairs.join("; ")).ok()
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(raw) = std::env::var("ARXIV_COOKIE") {
            if let Some(value) = cookie_header(&raw) {
                headers.insert(COOKIE, value);
            }
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self { client, base_sleep: Duration::from_millis(500) })
    }

    /// GET with bounded retry: up to 3 guarded tries, sleeping
    /// `base_sleep * attempt` after each failure, then one final unguarded
    /// attempt whose error propagates to the caller. With `raise_for_status`
    /// unset, non-2xx bodies are returned instead of failing.
    pub fn get(&self, url: &str, raise_for_status: bool) -> Result<String> {
        for attempt in 1..=TRIES {
            match self.try_get(url, raise_for_status) {
                Ok(body) => return Ok(body),
                Err(err) => {
                    warn!(attempt, url, error = %err, "request failed");
                    thread::sleep(self.base_sleep * attempt);
                }
            }
        }
        self.try_get(url, raise_for_status)
    }

    fn try_get(&self, url: &str, raise_for_status: bool) -> Result<String> {
        let resp = self.client.get(url).send()?;
        let resp = if raise_for_status { resp.error_for_status()? } else { resp };
        Ok(resp.text()?)
    }
}
