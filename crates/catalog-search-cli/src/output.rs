//! Output formatting for search results and index statistics.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use catalog_search_core::search::{IndexOrigin, IndexStats, SearchResult};
use serde::Serialize;

/// Maximum characters to show in a description snippet
const SNIPPET_MAX_LEN: usize = 160;

/// JSON output structure for search results
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub query: &'a str,
    pub mode: &'a str,
    pub results: Vec<JsonResult>,
}

/// One ranked document in JSON format
#[derive(Serialize)]
pub struct JsonResult {
    pub id: String,
    pub title: String,
    pub category: String,
    /// Combined (or single-signal raw) score used for ranking
    pub score: f32,
    pub semantic_score: f32,
    pub keyword_score: f32,
    pub semantic_normalized: f32,
    pub keyword_normalized: f32,
    /// Pass-through catalog fields (price, unit, ...)
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl From<&SearchResult> for JsonResult {
    fn from(result: &SearchResult) -> Self {
        Self {
            id: result.doc_id.to_string(),
            title: result.document.title.clone(),
            category: result.document.category.clone(),
            score: result.combined_score,
            semantic_score: result.semantic_score,
            keyword_score: result.keyword_score,
            semantic_normalized: result.semantic_normalized,
            keyword_normalized: result.keyword_normalized,
            attributes: result.document.attributes.clone(),
        }
    }
}

/// Formats search results as JSON.
pub fn format_json(query: &str, mode: &str, results: &[SearchResult]) -> String {
    let output = JsonOutput {
        query,
        mode,
        results: results.iter().map(JsonResult::from).collect(),
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats search results for human-readable terminal output.
pub fn format_human(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results found for \"{}\"", query);
    }

    let mut output = String::new();
    output.push_str(&format!(
        "Found {} item{} for \"{}\":\n\n",
        results.len(),
        if results.len() == 1 { "" } else { "s" },
        query
    ));

    for (i, result) in results.iter().enumerate() {
        let doc = &result.document;
        let title = if doc.title.is_empty() {
            result.doc_id.as_str()
        } else {
            doc.title.as_str()
        };
        output.push_str(&format!(
            "{}. {} [{}] (score: {:.2})\n",
            i + 1,
            title,
            result.doc_id,
            result.combined_score
        ));

        let mut score_parts = Vec::new();
        if result.semantic_score != 0.0 {
            score_parts.push(format!("semantic: {:.2}", result.semantic_score));
        }
        if result.keyword_score != 0.0 {
            score_parts.push(format!("keyword: {:.2}", result.keyword_score));
        }
        if !score_parts.is_empty() {
            output.push_str(&format!("   [{}]\n", score_parts.join(", ")));
        }

        if !doc.category.is_empty() {
            output.push_str(&format!("   Category: {}\n", doc.category));
        }
        if !doc.description.trim().is_empty() {
            output.push_str(&format!(
                "   {}\n",
                truncate_text(&doc.description, SNIPPET_MAX_LEN)
            ));
        }

        output.push('\n');
    }

    output.trim_end().to_string()
}

/// Formats index statistics as JSON.
pub fn format_stats_json(stats: &IndexStats) -> String {
    serde_json::to_string_pretty(stats).unwrap_or_else(|_| "{}".to_string())
}

/// Formats index statistics for the terminal.
pub fn format_stats_human(stats: &IndexStats) -> String {
    let origin = match stats.origin {
        IndexOrigin::Built => "built from catalog",
        IndexOrigin::Cache => "loaded from cache",
    };
    format!(
        "Documents indexed: {}\n\
         Encoder:           {} ({} dimensions)\n\
         Vocabulary:        {} terms\n\
         Avg doc length:    {:.1} tokens\n\
         Generation:        {} ({})",
        stats.documents_indexed,
        stats.encoder_version,
        stats.dimension,
        stats.vocabulary_size,
        stats.avg_doc_length,
        stats.generation,
        origin
    )
}

/// Truncates text to a maximum length, adding ellipsis if needed.
fn truncate_text(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let cut = text
        .char_indices()
        .nth(max_len)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let truncated = &text[..cut];
    // Prefer a word boundary
    match truncated.rfind(' ') {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}
