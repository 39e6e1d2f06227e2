use super::retry::{RetryError, RetryPolicy};
use crate::infrastructure::repositories::ContentRepository;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

/// Pages shorter than this after whitespace collapsing carry no content
pub const MIN_PAGE_CHARS: usize = 50;
/// Rejected texts shorter than this are not split further
pub const MIN_SPLIT_CHARS: usize = 1000;
pub const FALLBACK_SNIPPET_CHARS: usize = 500;
pub const MAX_SUMMARY_CHARS: usize = 2000;

/// A page worth summarizing, with its 1-based position in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: usize,
    pub text: String,
}

/// Collapse whitespace and drop near-empty pages
pub fn normalize_pages(pages: &[String]) -> Vec<PageText> {
    pages
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            (text.chars().count() >= MIN_PAGE_CHARS).then_some(PageText {
                number: index + 1,
                text,
            })
        })
        .collect()
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Split at the last ". " before the midpoint, or at the midpoint itself
/// when there is no sentence boundary in the first half.
pub fn split_on_sentence_boundary(text: &str) -> (String, String) {
    let mid = truncate_chars(text, text.chars().count() / 2).len();
    match text[..mid].rfind(". ") {
        Some(idx) => (
            text[..idx + 1].trim().to_string(),
            text[idx + 1..].trim().to_string(),
        ),
        None => (
            text[..mid].trim().to_string(),
            text[mid..].trim().to_string(),
        ),
    }
}

pub fn combine_summaries(summaries: &[String]) -> String {
    let joined = summaries.join(" ");
    truncate_chars(&joined, MAX_SUMMARY_CHARS).to_string()
}

fn summary_prompt(text: &str) -> String {
    format!(
        "Summarize the following academic content in a concise, \
         concept-focused manner. Preserve key ideas:\n\n{}",
        text
    )
}

fn snippet_prompt(text: &str) -> String {
    format!("Summarize this small snippet concisely:\n\n{}", text)
}

/// Summarizes page text, splitting input the content service refuses
pub struct Summarizer {
    content: Arc<dyn ContentRepository>,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(content: Arc<dyn ContentRepository>, retry: RetryPolicy) -> Self {
        Self { content, retry }
    }

    /// Transient failures that outlive the retry budget are returned.
    /// Rejected input is split in two at a sentence boundary and each half
    /// summarized on its own.
    pub fn summarize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, RetryError>> {
        async move {
            let prompt = summary_prompt(text);
            match self
                .retry
                .run("summarize", || self.content.generate(&prompt))
                .await
            {
                Ok(summary) => Ok(summary),
                Err(e) if e.source.is_rejected() => {
                    let length = text.chars().count();
                    if length < MIN_SPLIT_CHARS {
                        return Ok(self.summarize_snippet(text).await);
                    }
                    tracing::debug!(length, "Summary prompt rejected, splitting text");
                    let (left, right) = split_on_sentence_boundary(text);
                    let left = self.summarize(&left).await?;
                    let right = self.summarize(&right).await?;
                    Ok(format!("{} {}", left, right))
                }
                Err(e) => Err(e),
            }
        }
        .boxed()
    }

    async fn summarize_snippet(&self, text: &str) -> String {
        let prompt = snippet_prompt(text);
        match self
            .retry
            .run("summarize_snippet", || self.content.generate(&prompt))
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "Snippet summary failed, using raw text");
                format!("{}...", truncate_chars(text, FALLBACK_SNIPPET_CHARS))
            }
        }
    }
}
