use anyhow::Result;
use reqwest::Client;
use std::path::Path;
use url::Url;

/// Fetches a URL with the SEC-required identifying User-Agent and returns
/// the body bytes.
pub async fn fetch_bytes(client: &Client, url: &Url, user_agent: &str) -> Result<Vec<u8>> {
    log::debug!("Fetching URL: {}", url);

    let response = client
        .get(url.as_str())
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(reqwest::header::ACCEPT_ENCODING, "gzip, deflate")
        .send()
        .await?;

    log::debug!("Response status: {}", response.status());

    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "HTTP request failed with status: {}",
            response.status()
        ));
    }

    let content = response.bytes().await?;
    log::debug!("Received {} bytes", content.len());
    Ok(content.to_vec())
}

pub async fn fetch_and_save(
    client: &Client,
    url: &Url,
    filepath: &Path,
    user_agent: &str,
) -> Result<()> {
    let content = fetch_bytes(client, url, user_agent).await?;
    std::fs::write(filepath, &content)?;
    log::debug!("Saved content to {:?}", filepath);
    Ok(())
}
