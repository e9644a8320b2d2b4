use crate::engine::Fetcher as FetcherT;
use crate::error::{ItemsenseError, Result};
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, REFERER, USER_AGENT,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

/* ===========================
FETCHER (browser-like, HTTP/1.1)
=========================== */

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
];

pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self> {
        // Force HTTP/1.1; some WAFs expect 1.1 + Connection: keep-alive
        let client = Client::builder()
            .http1_only()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

impl FetcherT for ReqwestFetcher {
    fn name(&self) -> &'static str {
        "reqwest-blocking"
    }

    fn fetch_blocking(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|_| ItemsenseError::InvalidUrl(url.into()))?;
        let origin = format!("{}://{}/", parsed.scheme(), parsed.host_str().unwrap_or(""));

        for (ua_idx, ua) in USER_AGENTS.iter().enumerate() {
            // Attempt 1: simple browser-like profile
            if let Ok(text) = self.try_once(url, ua, None) {
                return Ok(text);
            }

            // Small jitter before the optional referrer retry (only for first UA)
            if ua_idx == 0 {
                std::thread::sleep(Duration::from_millis(80 + jitter_ms(120)));
            }

            // Attempt 2: same-site Referer
            match self.try_once(url, ua, Some(&origin)) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if ua_idx == USER_AGENTS.len() - 1 {
                        return Err(e);
                    }
                }
            }

            // Between UAs
            std::thread::sleep(Duration::from_millis(120 + jitter_ms(160)));
        }

        Err(ItemsenseError::Fetch(
            "request failed after simple attempts".into(),
        ))
    }
}

impl ReqwestFetcher {
    fn try_once(&self, url: &str, ua: &str, referer: Option<&str>) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(ua).unwrap_or(HeaderValue::from_static("Mozilla/5.0")),
        );
        if let Some(r) = referer {
            if let Ok(v) = HeaderValue::from_str(r) {
                headers.insert(REFERER, v);
            }
        }

        let resp = self.client.get(url).headers(headers).send()?;
        let status = resp.status();
        let text = resp.text()?;

        if status.is_success() && !looks_blocked(&text) {
            return Ok(text);
        }
        Err(ItemsenseError::Fetch(format!(
            "http status {} for {}",
            status, url
        )))
    }
}

// Simple block-page detector
fn looks_blocked(body: &str) -> bool {
    let b = body.to_ascii_lowercase();
    b.contains("verify you are a human")
        || b.contains("captcha")
        || b.contains("cf-browser-verification")
        || b.contains("px-captcha")
        || b.contains("access denied")
}

// Small, dependency-free jitter (ms)
fn jitter_ms(range: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_nanos(0));
    let nanos = now.subsec_nanos() as u64;
    let micros = (now.as_micros() & 0xFFFF) as u64;
    (nanos ^ (micros << 5)) % range
}
