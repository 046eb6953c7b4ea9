//! Headless Chrome acquisition through chromiumoxide.
//!
//! The listing page fills in client-side, so this is the acquirer that sees
//! what a visitor sees. One browser process lives for the whole run; every
//! query opens its own tab so cookies carry over between locations.

use std::path::PathBuf;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use harvest_core::RawQuery;
use harvest_logging::{harvest_debug, harvest_info};
use tokio::task::JoinHandle;

use crate::{
    search_url, AcquireSettings, AcquiredContent, AcquisitionError, FailureKind, HarvestError,
    PageAcquirer,
};

/// Environment variable naming a Chrome or Chromium executable.
pub const BROWSER_PATH_ENV: &str = "HARVEST_CHROME_PATH";

const BROWSER_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

// Hides the automation flag that protection scripts check first.
const STEALTH_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined })";

/// Finds a browser executable: an explicit path, then `HARVEST_CHROME_PATH`,
/// then the usual names on `PATH`.
pub fn find_browser(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then_some(path);
    }
    if let Ok(path) = std::env::var(BROWSER_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }
    BROWSER_NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
}

pub struct BrowserAcquirer {
    settings: AcquireSettings,
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserAcquirer {
    /// Launches the browser. Every failure here is fatal for the run.
    pub async fn launch(
        settings: AcquireSettings,
        executable: Option<PathBuf>,
    ) -> Result<Self, HarvestError> {
        let executable = find_browser(executable).ok_or_else(|| {
            init_error(format!(
                "no Chrome or Chromium executable found (set {BROWSER_PATH_ENV})"
            ))
        })?;
        harvest_info!("Launching browser {}", executable.display());

        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .disable_default_args()
            .arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--window-size=1920,1080")
            .arg(format!("--user-agent={}", settings.user_agent))
            .arg(format!("--lang={}", settings.locale))
            .build()
            .map_err(init_error)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| init_error(err.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            settings,
            browser,
            handler,
        })
    }

    async fn render(&self, url: &str) -> Result<(String, String), AcquisitionError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(backend_error)?;
        page.evaluate_on_new_document(STEALTH_SCRIPT)
            .await
            .map_err(backend_error)?;

        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        let outcome = match tokio::time::timeout(self.settings.request_timeout, navigation).await {
            Ok(Ok(())) => {
                let settle = self.settings.settle.sample();
                if !settle.is_zero() {
                    tokio::time::sleep(settle).await;
                }
                let html = page.content().await.map_err(backend_error);
                let final_url = page.url().await.ok().flatten().unwrap_or_else(|| url.to_string());
                html.map(|html| (html, final_url))
            }
            Ok(Err(err)) => Err(AcquisitionError::new(FailureKind::Network, err.to_string())),
            Err(_) => Err(AcquisitionError::new(
                FailureKind::Timeout,
                format!("navigation took longer than {:?}", self.settings.request_timeout),
            )),
        };

        let _ = page.close().await;
        outcome
    }
}

impl Drop for BrowserAcquirer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait::async_trait]
impl PageAcquirer for BrowserAcquirer {
    async fn acquire(&self, query: &RawQuery) -> Result<AcquiredContent, AcquisitionError> {
        let url = search_url(&self.settings, query)?;
        harvest_debug!("Rendering {}", url);

        let (html, final_url) = self.render(url.as_str()).await?;
        let size = html.len() as u64;
        if size > self.settings.max_bytes {
            return Err(AcquisitionError::new(
                FailureKind::TooLarge {
                    max_bytes: self.settings.max_bytes,
                    actual: Some(size),
                },
                "rendered document too large",
            ));
        }

        // The DOM is serialized by the browser, so the status of the
        // navigation response is not observable here.
        Ok(AcquiredContent {
            html,
            final_url,
            status: 200,
            encoding_label: "UTF-8".to_string(),
        })
    }
}

fn init_error(message: impl Into<String>) -> HarvestError {
    HarvestError::AcquirerInit(AcquisitionError::new(FailureKind::Backend, message))
}

fn backend_error(err: chromiumoxide::error::CdpError) -> AcquisitionError {
    AcquisitionError::new(FailureKind::Backend, err.to_string())
}
