use crate::domain::model::NONE_FOUND;
use crate::domain::ports::CompletionProvider;
use crate::utils::error::Result;
use futures::StreamExt;

/// Instruction sent to the LLM with the search text spliced in verbatim.
pub fn build_instruction(search_text: &str) -> String {
    format!(
        "Extract the names, job titles, and email addresses from the following search results: {}. \
         Return the data in the format: Name | Job title | Email Address. \
         Each person should be in a separate row. \
         Only return an email address if it contains an '@' symbol, otherwise return 'none found'. \
         No extra text or explanations.",
        search_text
    )
}

/// Turns search text into `Name | Job title | Email Address` rows via an LLM.
pub struct ContactExtractor<L: CompletionProvider> {
    llm: L,
}

impl<L: CompletionProvider> ContactExtractor<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }

    /// Never fails: any LLM error is logged and reported as `none found`
    /// so one bad row does not stop the table run.
    pub async fn extract_contacts(&self, search_text: &str) -> String {
        match self.try_extract(search_text).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error processing content with LLM API: {}", e);
                NONE_FOUND.to_string()
            }
        }
    }

    async fn try_extract(&self, search_text: &str) -> Result<String> {
        let instruction = build_instruction(search_text);
        let mut stream = self.llm.stream_completion(&instruction).await?;

        let mut accumulated = String::new();
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            if let Some(delta) = chunk?.delta {
                accumulated.push_str(&delta);
            }
            chunks += 1;
        }

        tracing::debug!("Completion stream drained after {} chunks", chunks);
        Ok(accumulated.trim().to_string())
    }
}
