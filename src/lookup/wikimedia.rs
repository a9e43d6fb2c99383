use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;

use crate::garden_core::config::LookupConfig;
use crate::lookup::{MediaSource, PlantMedia, RelatedLink};

/// Wikipedia page images plus Commons search results, fetched over HTTPS.
pub struct WikimediaSource {
    client: Client,
    config: LookupConfig,
}

impl WikimediaSource {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn get_json(&self, url: Url) -> Result<Value> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("request to {} failed", url.host_str().unwrap_or("?")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("http status {}", status.as_u16()));
        }
        response.json().context("response was not json")
    }
}

impl MediaSource for WikimediaSource {
    fn fetch(&self, key: &str) -> Result<PlantMedia> {
        let images = self.get_json(image_query_url(&self.config, key)?)?;
        let image_url = match first_image_file(&images) {
            Some(name) => Some(file_url(&self.config, &name)?.to_string()),
            None => None,
        };

        let search = self.get_json(related_search_url(&self.config, key)?)?;
        let links = related_titles(&search)
            .into_iter()
            .take(self.config.max_links)
            .map(|title| {
                article_url(&self.config, &title).map(|url| RelatedLink {
                    url: url.to_string(),
                    title,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PlantMedia { image_url, links })
    }
}

pub fn image_query_url(config: &LookupConfig, title: &str) -> Result<Url> {
    Url::parse_with_params(
        &config.wiki_api,
        &[
            ("action", "query"),
            ("format", "json"),
            ("prop", "images"),
            ("titles", title),
        ],
    )
    .context("invalid wiki api url")
}

pub fn related_search_url(config: &LookupConfig, query: &str) -> Result<Url> {
    Url::parse_with_params(
        &config.commons_api,
        &[
            ("action", "query"),
            ("format", "json"),
            ("generator", "search"),
            ("gsrsearch", query),
            ("prop", "imageinfo"),
            ("iiprop", "url"),
        ],
    )
    .context("invalid commons api url")
}

/// Direct link to a Commons file by name.
pub fn file_url(config: &LookupConfig, file_name: &str) -> Result<Url> {
    with_segment(&config.file_path_base, file_name)
}

/// Encyclopedia article for `title`, spaces written as underscores.
pub fn article_url(config: &LookupConfig, title: &str) -> Result<Url> {
    with_segment(&config.article_base, &title.replace(' ', "_"))
}

fn with_segment(base: &str, segment: &str) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("invalid base url {base}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("base url {base} cannot take a path"))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// Name of the first image listed on the first page of a `prop=images`
/// response, without its `File:` namespace.
pub fn first_image_file(response: &Value) -> Option<String> {
    let pages = response.get("query")?.get("pages")?.as_object()?;
    let page = pages.values().next()?;
    let title = page.get("images")?.as_array()?.first()?.get("title")?.as_str()?;
    Some(title.strip_prefix("File:").unwrap_or(title).to_string())
}

/// Titles from a `generator=search` response, in search rank order.
pub fn related_titles(response: &Value) -> Vec<String> {
    let Some(pages) = response
        .get("query")
        .and_then(|q| q.get("pages"))
        .and_then(Value::as_object)
    else {
        return Vec::new();
    };

    let mut ranked: Vec<(u64, String)> = pages
        .values()
        .filter_map(|page| {
            let title = page.get("title")?.as_str()?.to_string();
            let rank = page.get("index").and_then(Value::as_u64).unwrap_or(u64::MAX);
            Some((rank, title))
        })
        .collect();
    ranked.sort();
    ranked.into_iter().map(|(_, title)| title).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn image_file_comes_from_first_page() {
        let response = json!({
            "query": { "pages": { "45210": {
                "pageid": 45210,
                "title": "Helianthus annuus",
                "images": [
                    { "ns": 6, "title": "File:Sunflower sky backdrop.jpg" },
                    { "ns": 6, "title": "File:Other.jpg" }
                ]
            } } }
        });
        assert_eq!(
            first_image_file(&response).as_deref(),
            Some("Sunflower sky backdrop.jpg")
        );
    }

    #[test]
    fn page_without_images_has_no_file() {
        let response = json!({ "query": { "pages": { "-1": { "title": "Nope", "missing": "" } } } });
        assert_eq!(first_image_file(&response), None);
        assert_eq!(first_image_file(&json!({})), None);
    }

    #[test]
    fn related_titles_follow_search_rank() {
        let response = json!({
            "query": { "pages": {
                "9": { "title": "Lavandula stoechas", "index": 2 },
                "3": { "title": "Lavender field", "index": 1 }
            } }
        });
        assert_eq!(
            related_titles(&response),
            vec!["Lavender field".to_string(), "Lavandula stoechas".to_string()]
        );
        assert!(related_titles(&json!({ "batchcomplete": "" })).is_empty());
    }

    #[test]
    fn urls_are_encoded() {
        let config = LookupConfig::default();
        assert_eq!(
            article_url(&config, "Rosa canina").unwrap().as_str(),
            "https://en.wikipedia.org/wiki/Rosa_canina"
        );
        assert_eq!(
            file_url(&config, "Sun flower.jpg").unwrap().as_str(),
            "https://commons.wikimedia.org/wiki/Special:FilePath/Sun%20flower.jpg"
        );
        let query = image_query_url(&config, "Quercus robur").unwrap();
        assert!(query.as_str().contains("titles=Quercus+robur"));
        assert!(query.as_str().contains("prop=images"));
    }
}
