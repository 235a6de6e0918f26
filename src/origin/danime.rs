use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use super::Scraper;
use crate::error::FetchError;
use crate::models::{EpisodeRecord, HistoryEntry, ScrapedItem, TrackedItemId};

pub const DEFAULT_BASE_URL: &str = "https://animestore.docomo.ne.jp/animestore";

/// HTTP scraper for the d-anime store work pages.
#[derive(Debug, Clone)]
pub struct DanimeScraper {
    client: reqwest::Client,
    base_url: String,
}

impl DanimeScraper {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn item_url(&self, id: TrackedItemId) -> String {
        format!("{}/ci_pc?workId={}", self.base_url, id)
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Scraper for DanimeScraper {
    async fn fetch(&self, id: TrackedItemId) -> Result<ScrapedItem, FetchError> {
        let url = self.item_url(id);
        info!(%id, %url, "fetching item page");
        let html = self.fetch_page(&url).await?;
        // Html is not Send, so parsing stays out of the await chain.
        parse_item_page(id, &html, &self.base_url)
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, FetchError> {
        let url = format!("{}/mp_viw_pc", self.base_url);
        info!(%url, "fetching viewing history");
        let html = self.fetch_page(&url).await?;
        parse_history_page(&html)
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|err| FetchError::Parse {
        page: "selector".to_string(),
        reason: format!("{css}: {err:?}"),
    })
}

fn pattern(re: &str) -> Result<Regex, FetchError> {
    Regex::new(re).map_err(|err| FetchError::Parse {
        page: "pattern".to_string(),
        reason: err.to_string(),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, css: &Selector) -> Option<String> {
    scope.select(css).next().map(text_of)
}

/// Thumbnail URLs end in the 13-digit millisecond timestamp of the upload.
fn created_at_from_thumbnail(src: &str) -> DateTime<Utc> {
    let millis = src
        .len()
        .checked_sub(13)
        .filter(|start| src.is_char_boundary(*start))
        .and_then(|start| src[start..].parse::<i64>().ok());

    match millis.and_then(DateTime::<Utc>::from_timestamp_millis) {
        Some(created_at) => created_at,
        None => {
            debug!(src, "thumbnail carries no timestamp");
            DateTime::<Utc>::default()
        }
    }
}

/// Parses a work page into a snapshot.
pub fn parse_item_page(
    id: TrackedItemId,
    html: &str,
    base_url: &str,
) -> Result<ScrapedItem, FetchError> {
    let base_url = base_url.trim_end_matches('/');
    let page = format!("work {id}");
    let parse_error = |reason: String| FetchError::Parse {
        page: page.clone(),
        reason,
    };

    let document = Html::parse_document(html);
    let root = document.root_element();

    let anchors = selector("div.episodeContainer a")?;
    let thumbnail = selector("div.thumbnailContainer img")?;
    let number_sel = selector("div.textContainer span.line1 span.number")?;
    let episode_title_sel = selector("div.textContainer h3.line2 span")?;
    let title_sel = selector("div.titleWrap h1")?;
    let description_sel = selector(r#"meta[name="description"]"#)?;
    let tag_area = selector("div.tagArea")?;

    let number_re = pattern(r"\d+")?;
    let season_re = pattern(r"\d{4}年(春|夏|秋|冬)")?;

    let mut episodes = Vec::new();
    for anchor in root.select(&anchors) {
        let Some(episode_id) = anchor.value().id().filter(|id| id.contains("episodePartId")) else {
            continue;
        };

        let number_text = first_text(anchor, &number_sel).unwrap_or_default();
        let number = number_re
            .find(&number_text)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(|| {
                parse_error(format!(
                    "episode {episode_id} has no number (got '{number_text}')"
                ))
            })?;

        let part_id = anchor
            .value()
            .attr("href")
            .unwrap_or_default()
            .replace("cd_pc?partId=", "");

        let created_at = anchor
            .select(&thumbnail)
            .next()
            .and_then(|img| img.value().attr("data-src"))
            .map(created_at_from_thumbnail)
            .unwrap_or_default();

        episodes.push(EpisodeRecord {
            id: episode_id.to_string(),
            number,
            title: first_text(anchor, &episode_title_sel).unwrap_or_default(),
            url: format!("{base_url}/sc_d_pc?partId={part_id}"),
            watched: anchor.value().classes().any(|class| class == "watched"),
            created_at,
        });
    }

    if episodes.is_empty() {
        return Err(parse_error("no episodes found".to_string()));
    }

    let title = first_text(root, &title_sel).unwrap_or_default();

    let description = root
        .select(&description_sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    // The last matching tag wins when several areas carry one.
    let season_tag = root
        .select(&tag_area)
        .filter_map(|area| {
            season_re
                .find(&text_of(area))
                .map(|m| m.as_str().to_string())
        })
        .last()
        .unwrap_or_default();

    debug!(%id, episodes = episodes.len(), %title, "parsed work page");

    Ok(ScrapedItem {
        id,
        title,
        description,
        season_tag,
        page_url: format!("{base_url}/ci_pc?workId={id}"),
        episodes,
    })
}

/// Parses the viewing history page. Works appearing more than once are reported once.
pub fn parse_history_page(html: &str) -> Result<Vec<HistoryEntry>, FetchError> {
    let document = Html::parse_document(html);
    let links = selector("div.itemModule a.textContainer")?;
    let title_sel = selector("h2.line1 span")?;
    let work_id_re = pattern(r"workId=(\d+)")?;

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for link in document.root_element().select(&links) {
        let href = link.value().attr("href").unwrap_or_default();
        let Some(id) = work_id_re
            .captures(href)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .map(TrackedItemId)
        else {
            continue;
        };

        if seen.insert(id) {
            entries.push(HistoryEntry {
                id,
                title: first_text(link, &title_sel).unwrap_or_default(),
            });
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_at_from_thumbnail() {
        let created = created_at_from_thumbnail("https://cdn.test/thumb_1700000000123");
        assert_eq!(created.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_created_at_without_timestamp_falls_back_to_epoch() {
        assert_eq!(created_at_from_thumbnail("short").timestamp_millis(), 0);
        assert_eq!(
            created_at_from_thumbnail("https://cdn.test/no-digits-here.png").timestamp_millis(),
            0
        );
    }

    #[test]
    fn test_item_url() {
        let scraper = DanimeScraper::new(
            "https://example.test/store/",
            "watch-tracker-test",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            scraper.item_url(TrackedItemId(26609)),
            "https://example.test/store/ci_pc?workId=26609"
        );
    }
}
