//! Catalogue downloads from Telegram

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::FileId;
use url::Url;

use eaglecore::{config, FileFetcher};

/// Fetches uploaded documents through the Bot API `getFile` + file endpoint.
///
/// Works against the official API and a local Bot API server (BOT_API_URL).
pub struct TelegramFiles {
    bot: Bot,
    http: reqwest::Client,
}

impl TelegramFiles {
    pub fn new(bot: Bot) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .build()?;
        Ok(Self { bot, http })
    }
}

/// `{base}/file/bot{token}/{path}`; a local server reports absolute paths
/// under its data directory which must be made relative first.
fn file_url(base: &Url, token: &str, file_path: &str) -> Result<Url> {
    let container_prefix = "/var/lib/telegram-bot-api/";
    let relative = file_path.strip_prefix(container_prefix).unwrap_or(file_path);

    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("BOT_API_URL cannot be a base URL"))?;
        segments.pop_if_empty();
        segments.push("file");
        segments.push(&format!("bot{token}"));
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            segments.push(segment);
        }
    }
    Ok(url)
}

#[async_trait]
impl FileFetcher for TelegramFiles {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;
        log::debug!("Catalogue {}: path = {}, size = {} bytes", file_id, file.path, file.size);

        let url = file_url(&self.bot.api_url(), self.bot.token(), &file.path)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Telegram file download failed (path={}, status={})",
                file.path,
                status
            ));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
