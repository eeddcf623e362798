use crate::config::ProviderConfig;
use crate::source::SourceError;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Status and body of a finished request. Non-2xx answers are returned too,
/// since the provider puts its error description in the body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: Url,
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// reqwest client holding the provider session: cookie jar plus a lazily
/// fetched crumb that authenticated endpoints expect as a query parameter.
pub struct HttpClient {
    inner: reqwest::Client,
    cookie_url: String,
    crumb_url: Url,
    crumb: Mutex<Option<String>>,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig, crumb_url: Url) -> Result<Self, SourceError> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // The crumb is only valid together with the session cookie
            .cookie_store(true)
            .build()?;

        Ok(Self {
            inner,
            cookie_url: config.cookie_url.clone(),
            crumb_url,
            crumb: Mutex::new(None),
        })
    }

    pub async fn get(&self, url: Url) -> Result<HttpResponse, SourceError> {
        debug!("GET {}", url);
        let resp = self
            .inner
            .get(url.clone())
            .header(reqwest::header::REFERER, "https://finance.yahoo.com/")
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { url, status, body })
    }

    /// Cached crumb, fetched on first use.
    pub async fn crumb(&self) -> Result<String, SourceError> {
        if let Some(crumb) = self.cached_crumb() {
            return Ok(crumb);
        }
        let crumb = self.fetch_crumb().await?;
        *self.crumb.lock().unwrap_or_else(|e| e.into_inner()) = Some(crumb.clone());
        Ok(crumb)
    }

    pub fn invalidate_crumb(&self) {
        *self.crumb.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn cached_crumb(&self) -> Option<String> {
        self.crumb.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn fetch_crumb(&self) -> Result<String, SourceError> {
        // fc.yahoo.com answers 404 but still sets the session cookie
        if let Err(e) = self.inner.get(&self.cookie_url).send().await {
            warn!("Session cookie request failed: {}", e);
        }

        let resp = self.get(self.crumb_url.clone()).await?;
        if !resp.is_success() {
            return Err(SourceError::Auth(format!(
                "crumb endpoint returned HTTP {}",
                resp.status
            )));
        }
        parse_crumb(&resp.body)
    }
}

/// Crumbs are short opaque tokens; anything else is an error page.
pub fn parse_crumb(body: &str) -> Result<String, SourceError> {
    let body = body.trim();
    if body.is_empty()
        || body.len() >= 100
        || body.contains(char::is_whitespace)
        || body.contains('<')
    {
        return Err(SourceError::Auth("unexpected crumb payload".to_string()));
    }
    Ok(body.to_string())
}
