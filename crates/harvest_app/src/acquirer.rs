use std::sync::Arc;

use harvest_engine::{HttpAcquirer, PageAcquirer};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// How listing pages are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum AcquirerKind {
    /// Plain HTTP GET of the locator page.
    #[default]
    Http,
    /// Headless Chrome, for listings rendered client-side.
    Browser,
}

/// Starts the configured acquirer. A browser is launched once here and
/// shared by every location of the run.
pub async fn build_acquirer(config: &AppConfig) -> anyhow::Result<Arc<dyn PageAcquirer>> {
    match config.acquirer {
        AcquirerKind::Http => Ok(Arc::new(HttpAcquirer::new(config.acquire_settings())?)),
        AcquirerKind::Browser => launch_browser(config).await,
    }
}

#[cfg(feature = "browser")]
async fn launch_browser(config: &AppConfig) -> anyhow::Result<Arc<dyn PageAcquirer>> {
    let acquirer = harvest_engine::BrowserAcquirer::launch(
        config.acquire_settings(),
        config.browser_path.clone(),
    )
    .await?;
    Ok(Arc::new(acquirer))
}

#[cfg(not(feature = "browser"))]
async fn launch_browser(_config: &AppConfig) -> anyhow::Result<Arc<dyn PageAcquirer>> {
    anyhow::bail!("built without browser support; rebuild with `--features browser`")
}
