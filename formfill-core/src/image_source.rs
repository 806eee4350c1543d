//! Image source resolution
//!
//! An image source can be raw bytes, an `http(s)` URL, a bare `www.` host, a
//! `data:` URL or plain base64 text. Resolution either yields the raw image
//! bytes or a [`ResolveError`] explaining why the image is skipped.

use crate::request::ImageSource;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default ceiling for downloaded images (10 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10_485_760;

/// Timeout for remote image fetches
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_allow_trailing_bits(true)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Why an image source produced no bytes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("no image source given")]
    MissingSource,

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("remote server answered with status {0}")]
    HttpStatus(u16),

    #[error("image is larger than {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("source is not valid base64")]
    InvalidBase64,

    #[error("image source is empty")]
    Empty,
}

/// Fetches remote images
pub trait ImageFetcher: Send + Sync {
    /// Download `url`, refusing bodies larger than `max_bytes`
    fn fetch(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, ResolveError>;
}

/// Blocking HTTP fetcher backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FETCH_TIMEOUT)
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, ResolveError> {
        // The blocking client owns a runtime, so it is created and dropped on
        // the calling (non-async) thread.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ResolveError::Fetch(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .map_err(|e| ResolveError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::HttpStatus(status.as_u16()));
        }
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(ResolveError::TooLarge { limit: max_bytes });
        }

        let mut body = Vec::new();
        response
            .take(max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| ResolveError::Fetch(e.to_string()))?;

        if body.len() as u64 > max_bytes {
            return Err(ResolveError::TooLarge { limit: max_bytes });
        }
        Ok(body)
    }
}

/// Turns [`ImageSource`]s into raw image bytes
#[derive(Clone)]
pub struct ImageResolver {
    fetcher: Arc<dyn ImageFetcher>,
    default_max_bytes: u64,
}

impl ImageResolver {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            default_max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_default_max_bytes(mut self, max_bytes: u64) -> Self {
        self.default_max_bytes = max_bytes;
        self
    }

    pub fn default_max_bytes(&self) -> u64 {
        self.default_max_bytes
    }

    /// Resolve `source` to image bytes.
    ///
    /// `max_bytes` caps remote downloads; `None` or `0` uses the default.
    pub fn resolve(
        &self,
        source: &ImageSource,
        max_bytes: Option<u64>,
    ) -> Result<Vec<u8>, ResolveError> {
        let bytes = match source {
            ImageSource::Raw(bytes) => bytes.clone(),
            ImageSource::Text(text) => {
                let text = text.trim();
                let url = normalize_url(text);
                if url.starts_with("http") {
                    let limit = max_bytes
                        .filter(|n| *n > 0)
                        .unwrap_or(self.default_max_bytes);
                    debug!(url = %url, limit, "fetching remote image");
                    let body = self.fetcher.fetch(&url, limit)?;
                    if body.len() as u64 > limit {
                        return Err(ResolveError::TooLarge { limit });
                    }
                    body
                } else {
                    decode_base64(text).ok_or(ResolveError::InvalidBase64)?
                }
            }
        };

        if bytes.is_empty() {
            return Err(ResolveError::Empty);
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("default_max_bytes", &self.default_max_bytes)
            .finish_non_exhaustive()
    }
}

/// Bare `www.` hosts are fetched over https
fn normalize_url(text: &str) -> String {
    if text.starts_with("www.") {
        format!("https://{text}")
    } else {
        text.to_string()
    }
}

/// Decode base64 text, tolerating `data:` URL prefixes, embedded whitespace,
/// missing padding and the URL-safe alphabet.
pub fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let mut payload = text.trim();
    if payload.starts_with("data:") {
        payload = payload.split_once(',').map(|(_, rest)| rest)?;
    }

    let mut cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let rem = cleaned.len() % 4;
    if rem != 0 {
        cleaned.extend(std::iter::repeat('=').take(4 - rem));
    }

    STANDARD_LENIENT
        .decode(&cleaned)
        .or_else(|_| URL_SAFE_LENIENT.decode(&cleaned))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves canned bodies and records requested URLs
    struct StubFetcher {
        body: Vec<u8>,
        requested: Mutex<Vec<(String, u64)>>,
    }

    impl StubFetcher {
        fn new(body: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_vec(),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    impl ImageFetcher for StubFetcher {
        fn fetch(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, ResolveError> {
            self.requested
                .lock()
                .unwrap()
                .push((url.to_string(), max_bytes));
            Ok(self.body.clone())
        }
    }

    #[test]
    fn test_raw_bytes_pass_through() {
        let resolver = ImageResolver::new(StubFetcher::new(b""));
        let bytes = resolver
            .resolve(&ImageSource::Raw(vec![1, 2, 3]), None)
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_www_is_rewritten_to_https() {
        let fetcher = StubFetcher::new(b"img");
        let resolver = ImageResolver::new(fetcher.clone());

        let bytes = resolver
            .resolve(&ImageSource::Text("  www.example.com/a.png ".into()), None)
            .unwrap();

        assert_eq!(bytes, b"img".to_vec());
        let requested = fetcher.requested.lock().unwrap();
        assert_eq!(
            requested[0],
            ("https://www.example.com/a.png".to_string(), DEFAULT_MAX_IMAGE_BYTES)
        );
    }

    #[test]
    fn test_oversize_body_is_rejected() {
        let fetcher = StubFetcher::new(&[0u8; 64]);
        let resolver = ImageResolver::new(fetcher);

        let err = resolver
            .resolve(&ImageSource::Text("http://img.test/big.png".into()), Some(16))
            .unwrap_err();

        assert_eq!(err, ResolveError::TooLarge { limit: 16 });
    }

    #[test]
    fn test_zero_max_bytes_uses_default() {
        let fetcher = StubFetcher::new(b"ok");
        let resolver = ImageResolver::new(fetcher.clone()).with_default_max_bytes(99);

        resolver
            .resolve(&ImageSource::Text("https://img.test/a".into()), Some(0))
            .unwrap();

        assert_eq!(fetcher.requested.lock().unwrap()[0].1, 99);
    }

    #[test]
    fn test_data_url_payload() {
        let resolver = ImageResolver::new(StubFetcher::new(b""));
        let bytes = resolver
            .resolve(
                &ImageSource::Text("data:image/png;base64,aGVs\nbG8".into()),
                None,
            )
            .unwrap();
        assert_eq!(bytes, b"hello".to_vec());
    }

    #[test]
    fn test_invalid_and_empty_sources() {
        let resolver = ImageResolver::new(StubFetcher::new(b""));
        assert_eq!(
            resolver.resolve(&ImageSource::Text("***".into()), None),
            Err(ResolveError::InvalidBase64)
        );
        assert_eq!(
            resolver.resolve(&ImageSource::Text("".into()), None),
            Err(ResolveError::Empty)
        );
        assert_eq!(
            resolver.resolve(&ImageSource::Raw(Vec::new()), None),
            Err(ResolveError::Empty)
        );
        assert_eq!(
            resolver.resolve(&ImageSource::Text("http://img.test/empty".into()), None),
            Err(ResolveError::Empty)
        );
    }

    #[test]
    fn test_decode_base64_variants() {
        assert_eq!(decode_base64("aGVsbG8="), Some(b"hello".to_vec()));
        assert_eq!(decode_base64("aGVsbG8"), Some(b"hello".to_vec()));
        assert_eq!(decode_base64(" aGVs bG8=\r\n"), Some(b"hello".to_vec()));
        // URL-safe alphabet
        assert_eq!(decode_base64("-_8"), Some(vec![0xfb, 0xff]));
        assert_eq!(decode_base64("data:image/png;base64"), None);
        assert_eq!(decode_base64("a"), None);
    }
}
