use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;

/// Minimum cleaned-text length for a source to be kept.
pub const MIN_CONTENT_LEN: usize = 200;

/// Many sites serve bot-looking clients an empty shell, so the
/// scraping client presents a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One hyperlink found on the entry page.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// One retained source: a page or transcript keyed by its URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedSource {
    pub url: String,
    pub text: String,
}

pub fn scraping_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Pull all anchors out of an HTML document as (text, href) pairs,
/// resolving relative hrefs against the page URL.
fn parse_links(html: &str, base: &str) -> Vec<Link> {
    let base_url = Url::parse(base).ok();
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let resolved = match &base_url {
                Some(base) => base.join(href).map(String::from).unwrap_or_else(|_| href.to_string()),
                None => href.to_string(),
            };
            Some(Link {
                text: element.text().collect::<Vec<_>>().join(" ").trim().to_string(),
                href: resolved,
            })
        })
        .collect()
}

/// Visible text of a whole document.
fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetch the entry page and list every hyperlink on it.
pub async fn extract_links(client: &reqwest::Client, url: &str) -> Result<Vec<Link>> {
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let links = parse_links(&html, url);
    debug!(count = links.len(), url, "extracted links");
    Ok(links)
}

/// Keep links whose anchor text contains any keyword,
/// case-insensitively.
pub fn filter_links_by_keywords(links: &[Link], keywords: &[String]) -> Vec<Link> {
    links
        .iter()
        .filter(|link| {
            let text = link.text.to_lowercase();
            keywords.iter().any(|k| text.contains(&k.to_lowercase()))
        })
        .cloned()
        .collect()
}

static NEWLINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static TABLE_REMNANTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\|.*?\|").unwrap());
static BOILERPLATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"Home\s+About Us.*?\s+Contact Us",
        r"This website uses cookies.*?Privacy & Cookies Policy",
        r"Copyright.*?Powered by.*",
    ]
    .iter()
    .map(|pattern| {
        RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
    .collect()
});

/// Collapse whitespace and strip common boilerplate blocks
/// (navigation, cookie banners, copyright footers, table remnants).
pub fn clean_page_text(text: &str) -> String {
    let mut text = NEWLINE_RUNS.replace_all(text, "\n").into_owned();
    text = WHITESPACE_RUNS.replace_all(&text, " ").into_owned();
    for re in BOILERPLATE.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    text = TABLE_REMNANTS.replace_all(&text, "").into_owned();
    text.trim().to_string()
}

/// Fetch and clean the text of each retained link. A failed fetch is
/// logged and dropped; partial results always proceed.
pub async fn fetch_page_texts(client: &reqwest::Client, links: &[Link]) -> Vec<ScrapedSource> {
    let mut sources = Vec::new();
    for link in links {
        let body = match client.get(&link.href).send().await {
            Ok(response) => match response.error_for_status() {
                Ok(response) => match response.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(url = %link.href, error = %e, "failed to read page body, skipping");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(url = %link.href, error = %e, "page returned error status, skipping");
                    continue;
                }
            },
            Err(e) => {
                warn!(url = %link.href, error = %e, "failed to fetch page, skipping");
                continue;
            }
        };
        sources.push(ScrapedSource {
            url: link.href.clone(),
            text: clean_page_text(&page_text(&body)),
        });
    }
    sources
}

/// Merge page sources and transcript sources (transcripts win on a URL
/// collision) and drop anything shorter than [`MIN_CONTENT_LEN`].
pub fn merge_sources(
    pages: Vec<ScrapedSource>,
    transcripts: Vec<ScrapedSource>,
) -> Vec<ScrapedSource> {
    let mut merged = pages;
    for transcript in transcripts {
        if let Some(existing) = merged.iter_mut().find(|s| s.url == transcript.url) {
            existing.text = transcript.text;
        } else {
            merged.push(transcript);
        }
    }
    merged
        .into_iter()
        .filter(|s| s.text.chars().count() >= MIN_CONTENT_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn parse_links_resolves_relative_hrefs() {
        let html = r#"<html><body>
            <a href="/about">About solar</a>
            <a href="https://youtube.com/watch?v=abc">Solar video</a>
        </body></html>"#;
        let links = parse_links(html, "https://example.com/home");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "https://example.com/about");
        assert_eq!(links[1].href, "https://youtube.com/watch?v=abc");
    }

    #[test]
    fn filter_links_matches_keywords_case_insensitively() {
        let links = vec![
            Link { text: "Our Solar Projects".into(), href: "a".into() },
            Link { text: "Careers".into(), href: "b".into() },
        ];
        let kept = filter_links_by_keywords(&links, &kw(&["solar"]));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].href, "a");
    }

    #[test]
    fn clean_page_text_strips_boilerplate_and_tables() {
        let raw = "Home   About Us   Services   Contact Us\nReal   content here\n| a | b |\nCopyright 2024 Powered by Acme";
        let cleaned = clean_page_text(raw);
        assert!(cleaned.contains("Real content here"));
        assert!(!cleaned.contains("About Us"));
        assert!(!cleaned.contains("| a |"));
        assert!(!cleaned.contains("Copyright"));
    }

    #[test]
    fn merge_sources_applies_length_floor() {
        let long_text = "solar ".repeat(50);
        let merged = merge_sources(
            vec![
                ScrapedSource { url: "a".into(), text: long_text.clone() },
                ScrapedSource { url: "b".into(), text: "too short".into() },
            ],
            vec![ScrapedSource { url: "c".into(), text: long_text }],
        );
        let urls: Vec<&str> = merged.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "c"]);
        for source in &merged {
            assert!(source.text.chars().count() >= MIN_CONTENT_LEN);
        }
    }

    #[tokio::test]
    async fn fetch_page_texts_skips_failing_sources() {
        let server = MockServer::start().await;
        let body = format!("<html><body><p>{}</p></body></html>", "solar panels ".repeat(40));
        Mock::given(method("GET"))
            .and(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let links = vec![
            Link { text: "good".into(), href: format!("{}/good", server.uri()) },
            // nothing listens on port 9, so this fetch fails outright
            Link { text: "bad".into(), href: "http://127.0.0.1:9/bad".into() },
        ];

        let sources = fetch_page_texts(&reqwest::Client::new(), &links).await;
        assert_eq!(sources.len(), 1);
        assert!(sources[0].url.ends_with("/good"));
        assert!(sources[0].text.contains("solar panels"));
    }

    #[tokio::test]
    async fn scraping_client_sends_browser_user_agent() {
        let server = MockServer::start().await;
        // the mock only answers requests carrying the browser UA
        Mock::given(method("GET"))
            .and(path("/"))
            // wiremock's exact `header` matcher splits values on commas,
            // which breaks on the comma inside "(KHTML, like Gecko)"; an
            // anchored regex checks the same exact value without splitting
            .and(header_regex("User-Agent", &format!("^{}$", regex::escape(USER_AGENT))))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<a href="/solar">Solar</a>"#),
            )
            .mount(&server)
            .await;

        let client = scraping_client().unwrap();
        let links = extract_links(&client, &server.uri()).await.unwrap();
        assert_eq!(links.len(), 1);

        // the default client is rejected by the same mock
        assert!(extract_links(&reqwest::Client::new(), &server.uri())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn extract_links_reads_anchors_from_live_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="/solar">Solar power</a><a href="/wind">Wind</a>"#,
            ))
            .mount(&server)
            .await;

        let links = extract_links(&reqwest::Client::new(), &server.uri())
            .await
            .unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "Solar power");
    }
}
