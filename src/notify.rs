//! Push notifications
//! Messages go to a Bark server: `GET {server}/{key}/{title}/{message}`

use crate::error::{Error, Result};
use crate::utils::format::command_line;
use async_trait::async_trait;
use reqwest::Url;

pub const DEFAULT_BARK_SERVER: &str = "https://api.day.app";

/// Anything that can deliver a short titled message
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, message: &str) -> Result<()>;
}

pub struct BarkNotifier {
    server: Url,
    key: String,
    client: reqwest::Client,
}

impl BarkNotifier {
    pub fn new(server: &str, key: &str) -> Result<Self> {
        if key.trim().is_empty() {
            return Err(Error::MissingNotifyKey);
        }
        let server = Url::parse(server).map_err(|e| Error::InvalidUrl(format!("{}: {}", server, e)))?;
        if server.cannot_be_a_base() {
            return Err(Error::InvalidUrl(server.to_string()));
        }
        Ok(Self {
            server,
            key: key.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Request URL with every path segment percent-encoded
    pub fn url_for(&self, title: &str, message: &str) -> Result<Url> {
        let mut url = self.server.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.server.to_string()))?
            .pop_if_empty()
            .push(&self.key)
            .push(title)
            .push(message);
        Ok(url)
    }
}

#[async_trait]
impl Notifier for BarkNotifier {
    async fn send(&self, title: &str, message: &str) -> Result<()> {
        let url = self.url_for(title, message)?;
        let response = self
            .client
            .get(url)
            .header("User-Agent", concat!("stool/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        if !response.status().is_success() {
            log::warn!("notification rejected: {}", response.status());
            return Err(Error::NotifyStatus(response.status().as_u16()));
        }

        log::debug!("notification sent: {}", title);
        Ok(())
    }
}

/// Default title: program name followed by its arguments
pub fn default_title() -> String {
    let args: Vec<String> = std::env::args().collect();
    command_line(&args)
}
