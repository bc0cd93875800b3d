use crate::domain::model::{CompletionChunk, InputRecord, OutputRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Finite, non-restartable sequence of completion fragments.
pub type CompletionStream = BoxStream<'static, Result<CompletionChunk>>;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
}

/// Web search provider. Returns the provider's results flattened into one text blob.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

/// Chat-completion provider that answers a single user message as a stream.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn stream_completion(&self, message: &str) -> Result<CompletionStream>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<InputRecord>>;
    async fn transform(&self, data: Vec<InputRecord>) -> Result<Vec<OutputRecord>>;
    async fn load(&self, result: Vec<OutputRecord>) -> Result<String>;
}
