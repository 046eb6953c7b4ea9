use std::time::Duration;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use futures_util::StreamExt;
use harvest_core::RawQuery;
use harvest_logging::harvest_debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::StatusCode;
use url::Url;

use crate::{AcquiredContent, AcquisitionError, FailureKind, HarvestError, JitterRange};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct AcquireSettings {
    pub base_url: String,
    pub locale: String,
    /// Search radius in miles.
    pub radius: u32,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Wait after each response so client-side listings can populate.
    pub settle: JitterRange,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            base_url: "https://events.pokemon.com".to_string(),
            locale: "en-US".to_string(),
            radius: 100,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            settle: JitterRange::from_secs(2, 6),
        }
    }
}

/// Fetches rendered content for one location query.
///
/// Implementations must not mutate state shared with other calls; the
/// orchestrator may call the same acquirer for every location of a run.
#[async_trait::async_trait]
pub trait PageAcquirer: Send + Sync {
    async fn acquire(&self, query: &RawQuery) -> Result<AcquiredContent, AcquisitionError>;
}

/// Plain HTTP acquisition. Does not execute scripts, so it only sees
/// listings that are present in the served markup.
#[derive(Debug, Clone)]
pub struct HttpAcquirer {
    settings: AcquireSettings,
    client: reqwest::Client,
}

impl HttpAcquirer {
    /// Builds the long-lived client shared by every location of a run.
    pub fn new(settings: AcquireSettings) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        let language = HeaderValue::from_str(&format!("{},en;q=0.5", settings.locale))
            .unwrap_or_else(|_| HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| {
                HarvestError::AcquirerInit(AcquisitionError::new(FailureKind::Backend, err.to_string()))
            })?;

        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &AcquireSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl PageAcquirer for HttpAcquirer {
    async fn acquire(&self, query: &RawQuery) -> Result<AcquiredContent, AcquisitionError> {
        let url = search_url(&self.settings, query)?;
        harvest_debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        // Protection pages come back as 403/429; hand them to the classifier.
        let readable = status.is_success()
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::TOO_MANY_REQUESTS;
        if !readable {
            return Err(AcquisitionError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let settle = self.settings.settle.sample();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        let (html, encoding_label) = decode_page(&bytes, content_type.as_deref())?;
        Ok(AcquiredContent {
            html,
            final_url,
            status: status.as_u16(),
            encoding_label,
        })
    }
}

/// Builds the event locator URL for one query.
pub fn search_url(settings: &AcquireSettings, query: &RawQuery) -> Result<Url, AcquisitionError> {
    let endpoint = format!("{}/EventLocator/Home", settings.base_url.trim_end_matches('/'));
    let params = [
        ("iskm", "false".to_string()),
        ("longitude", query.longitude.to_string()),
        ("latitude", query.latitude.to_string()),
        ("locale", settings.locale.clone()),
        ("range", settings.radius.to_string()),
        ("startdate", query.as_of_date.format("%Y-%m-%d").to_string()),
    ];
    Url::parse_with_params(&endpoint, &params)
        .map_err(|err| AcquisitionError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn too_large(max_bytes: u64, actual: u64) -> AcquisitionError {
    AcquisitionError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> AcquisitionError {
    if err.is_timeout() {
        return AcquisitionError::new(FailureKind::Timeout, err.to_string());
    }
    AcquisitionError::new(FailureKind::Network, err.to_string())
}

/// Decodes a body to UTF-8: BOM, then Content-Type charset, then a
/// `<meta charset>` declaration, then chardetng's guess.
fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<(String, String), AcquisitionError> {
    let declared = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(header_charset)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .or_else(|| meta_charset(bytes).and_then(|label| Encoding::for_label(label.as_bytes())));

    let encoding = declared.unwrap_or_else(|| {
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        detector.guess(None, true)
    });

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(AcquisitionError::new(
            FailureKind::Decode {
                encoding: encoding.name().to_string(),
            },
            "malformed byte sequence",
        ));
    }
    Ok((text.into_owned(), encoding.name().to_string()))
}

fn header_charset(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn meta_charset(bytes: &[u8]) -> Option<String> {
    // Declarations must appear early in the document.
    let head = &bytes[..bytes.len().min(1024)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!label.is_empty()).then_some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn search_url_matches_locator_query_shape() {
        let query = RawQuery {
            latitude: 30.2672,
            longitude: -97.7431,
            as_of_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        };
        let url = search_url(&AcquireSettings::default(), &query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://events.pokemon.com/EventLocator/Home?iskm=false&longitude=-97.7431&latitude=30.2672&locale=en-US&range=100&startdate=2025-06-01"
        );
    }

    #[test]
    fn decode_prefers_header_charset() {
        let (text, label) = decode_page(b"caf\xe9", Some("text/html; charset=ISO-8859-1")).unwrap();
        assert_eq!(text, "café");
        assert_eq!(label, "windows-1252");
    }

    #[test]
    fn decode_uses_meta_charset_without_header() {
        let body = b"<html><head><meta charset=\"iso-8859-1\"></head><body>caf\xe9</body></html>";
        let (text, _) = decode_page(body, Some("text/html")).unwrap();
        assert!(text.contains("café"));
    }

    #[test]
    fn decode_strips_utf8_bom() {
        let (text, label) = decode_page(b"\xEF\xBB\xBFhello", None).unwrap();
        assert_eq!(text, "hello");
        assert_eq!(label, "UTF-8");
    }
}
