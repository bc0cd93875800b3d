use crate::core::contacts::ContactExtractor;
use crate::core::prompt::{build_search_query, extract_prompt_info};
use crate::domain::ports::{CompletionProvider, WebSearcher};
use crate::utils::error::Result;

/// Runs prompt parsing, search and contact extraction for a single row.
pub struct RowProcessor<W: WebSearcher, L: CompletionProvider> {
    searcher: W,
    extractor: ContactExtractor<L>,
}

impl<W: WebSearcher, L: CompletionProvider> RowProcessor<W, L> {
    pub fn new(searcher: W, llm: L) -> Self {
        Self {
            searcher,
            extractor: ContactExtractor::new(llm),
        }
    }

    /// Search failures propagate; LLM failures come back as `none found`.
    pub async fn process(&self, prompt: &str) -> Result<String> {
        let parsed = extract_prompt_info(prompt);
        if parsed.subject_name.is_empty() && parsed.location.is_empty() {
            tracing::warn!("Prompt did not match 'At the school <name> in <location>': {:?}", prompt);
        }

        let query = build_search_query(&parsed);
        tracing::debug!("Search query: {}", query);

        let search_text = self.searcher.search(&query).await?;
        let result = self.extractor.extract_contacts(&search_text).await;

        Ok(result.trim().to_string())
    }
}
