//! Citations attached to text blocks.

use serde_json::Value;

use crate::{record, union};

#[record(tag = "char_location")]
pub struct CharLocationCitation {
    pub cited_text: String,
    pub document_index: u32,
    #[field(nullable)]
    pub document_title: Option<String>,
    pub start_char_index: u32,
    pub end_char_index: u32,
    pub file_id: Option<String>,
}

#[record(tag = "page_location")]
pub struct PageLocationCitation {
    pub cited_text: String,
    pub document_index: u32,
    #[field(nullable)]
    pub document_title: Option<String>,
    pub start_page_number: u32,
    pub end_page_number: u32,
    pub file_id: Option<String>,
}

#[record(tag = "content_block_location")]
pub struct ContentBlockLocationCitation {
    pub cited_text: String,
    pub document_index: u32,
    #[field(nullable)]
    pub document_title: Option<String>,
    pub start_block_index: u32,
    pub end_block_index: u32,
    pub file_id: Option<String>,
}

#[record(tag = "web_search_result_location")]
pub struct WebSearchResultLocationCitation {
    pub cited_text: String,
    pub encrypted_index: String,
    #[field(nullable)]
    pub title: Option<String>,
    pub url: String,
}

#[record(tag = "search_result_location")]
pub struct SearchResultLocationCitation {
    pub cited_text: String,
    pub search_result_index: u32,
    pub source: String,
    #[field(nullable)]
    pub title: Option<String>,
    pub start_block_index: u32,
    pub end_block_index: u32,
}

/// Where a piece of cited text came from.
#[union(open)]
pub enum TextCitation {
    #[variant(tag = "char_location")]
    CharLocation(CharLocationCitation),
    #[variant(tag = "page_location")]
    PageLocation(PageLocationCitation),
    #[variant(tag = "content_block_location")]
    ContentBlockLocation(ContentBlockLocationCitation),
    #[variant(tag = "web_search_result_location")]
    WebSearchResultLocation(WebSearchResultLocationCitation),
    #[variant(tag = "search_result_location")]
    SearchResultLocation(SearchResultLocationCitation),
    #[variant(unknown)]
    Unknown(Value),
}

impl TextCitation {
    /// The quoted text, for every citation kind this build knows.
    pub fn cited_text(&self) -> Option<String> {
        let text = match self {
            Self::CharLocation(c) => c.cited_text(),
            Self::PageLocation(c) => c.cited_text(),
            Self::ContentBlockLocation(c) => c.cited_text(),
            Self::WebSearchResultLocation(c) => c.cited_text(),
            Self::SearchResultLocation(c) => c.cited_text(),
            Self::Unknown(raw) => return raw.get("cited_text")?.as_str().map(str::to_string),
        };
        text.ok()
    }
}

/// Request-side switch enabling citations on a document.
#[record]
pub struct CitationsConfig {
    pub enabled: Option<bool>,
}
