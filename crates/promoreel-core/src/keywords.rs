use tracing::debug;

use crate::error::Result;
use crate::llm::ChatModel;

/// Fixed English stopword set applied to topic tokens and to the
/// model's expanded keyword list.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over",
    "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours",
];

fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}

/// Extract lowercase alphabetic tokens from the topic, dropping
/// stopwords and single-character tokens.
pub fn core_terms(topic: &str) -> Vec<String> {
    topic
        .split_whitespace()
        .filter(|term| term.chars().all(|c| c.is_alphabetic()))
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !is_stopword(term) && term.len() > 1)
        .collect()
}

/// Re-apply the stopword/length filter to a keyword list and drop
/// case-insensitive duplicates, keeping first occurrences in order.
fn refine_keywords<I: IntoIterator<Item = String>>(keywords: I) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();
    for keyword in keywords {
        let keyword = keyword.trim().to_string();
        if keyword.len() <= 1 || is_stopword(&keyword) {
            continue;
        }
        let lower = keyword.to_lowercase();
        if seen.contains(&lower) {
            continue;
        }
        seen.push(lower);
        result.push(keyword);
    }
    result
}

/// Derive the run's keyword list: topic tokens filtered against the
/// stopword set, expanded by one model call, comma-split and
/// re-filtered. An empty result is valid and short-circuits the
/// research stage upstream.
pub async fn select_keywords(chat: &dyn ChatModel, topic: &str) -> Result<Vec<String>> {
    let filtered = core_terms(topic);

    let prompt = format!(
        "Generate a list of relevant keywords related to the topic '{}'. \
         These keywords should help in filtering relevant content from a website. \
         Keywords from the topic are {:?}. Remove useless and add newly generated. \
         Output format: A list of keywords, separated by commas.",
        topic, filtered
    );

    let response = chat.invoke(&prompt).await?;
    let keywords = refine_keywords(
        response
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()),
    );
    debug!(count = keywords.len(), "selected keywords");
    Ok(keywords)
}
