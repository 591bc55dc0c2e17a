use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::keywords::select_keywords;
use crate::llm::ChatModel;
use crate::scrape::{
    ScrapedSource, extract_links, fetch_page_texts, filter_links_by_keywords, merge_sources,
};
use crate::transcript::harvest_video_transcripts;

/// Per-source summary of how the site owner addresses the topic.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSummary {
    pub url: String,
    pub summary: String,
}

/// Scrape a site for topic-relevant content: keyword-matched page
/// links plus keyword-matched video transcripts, merged and
/// length-filtered.
pub async fn scrape_site(
    client: &reqwest::Client,
    url: &str,
    keywords: &[String],
    transcripts_dir: &Path,
) -> Result<Vec<ScrapedSource>> {
    let links = extract_links(client, url).await?;
    let relevant = filter_links_by_keywords(&links, keywords);
    let pages = fetch_page_texts(client, &relevant).await;
    // The transcript pass scans all links, not just keyword-matched ones.
    let transcripts = harvest_video_transcripts(&links, keywords, transcripts_dir).await;
    Ok(merge_sources(pages, transcripts))
}

/// Ask the model, per source, whether the text is relevant to the
/// topic; keep sources whose answer contains "yes".
pub async fn filter_relevant_sources(
    chat: &dyn ChatModel,
    topic: &str,
    sources: Vec<ScrapedSource>,
) -> Result<Vec<ScrapedSource>> {
    let preamble = format!(
        "Given the topic '{}', evaluate the relevance of the following content. \
         Content is considered relevant if it partially or slightly related to the topic. \
         For each content piece, output 'yes' or 'no' based on this criterion.\n\n",
        topic
    );

    let mut relevant = Vec::new();
    for source in sources {
        let prompt = format!("{}Content: {}\n\nRelevance:", preamble, source.text);
        let verdict = chat.invoke(&prompt).await?;
        info!(url = %source.url, verdict = %verdict, "relevance check");
        if verdict.to_lowercase().contains("yes") {
            relevant.push(source);
        }
    }
    Ok(relevant)
}

/// Summarize, per source, how the company addresses the topic.
pub async fn summarize_sources(
    chat: &dyn ChatModel,
    topic: &str,
    sources: Vec<ScrapedSource>,
) -> Result<Vec<SourceSummary>> {
    let mut summaries = Vec::new();
    for source in sources {
        let prompt = format!(
            "Summarize how the company contributes to or solves the topic '{}' using the \
             extracted sections from their website({}). \
             Expected Output: A comprehensive summary explaining the company's role in \
             addressing the topic.\n{}\n\nSummary:",
            topic, source.url, source.text
        );
        let summary = chat.invoke(&prompt).await?;
        summaries.push(SourceSummary {
            url: source.url,
            summary,
        });
    }
    Ok(summaries)
}

/// The research stage: keywords → scrape → relevance filter →
/// summaries. Any empty intermediate result short-circuits to an
/// empty summary list; a scrape error degrades the same way.
pub async fn run_research(
    chat: &dyn ChatModel,
    client: &reqwest::Client,
    url: &str,
    topic: &str,
    transcripts_dir: &Path,
) -> Result<Vec<SourceSummary>> {
    let keywords = select_keywords(chat, topic).await?;
    info!(?keywords, "selected keywords");
    if keywords.is_empty() {
        info!("no keywords generated, stopping research");
        return Ok(Vec::new());
    }

    let scraped = match scrape_site(client, url, &keywords, transcripts_dir).await {
        Ok(scraped) => scraped,
        Err(e) => {
            warn!(error = %e, "error while scraping content");
            Vec::new()
        }
    };
    if scraped.is_empty() {
        info!("no content scraped, stopping research");
        return Ok(Vec::new());
    }

    let filtered = filter_relevant_sources(chat, topic, scraped).await?;
    if filtered.is_empty() {
        info!("no relevant content found, stopping research");
        return Ok(Vec::new());
    }

    summarize_sources(chat, topic, filtered).await
}
