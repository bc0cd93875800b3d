pub mod contacts;
pub mod etl;
pub mod pipeline;
pub mod prompt;
pub mod row;

pub use crate::domain::model::{InputRecord, OutputRecord};
pub use crate::domain::ports::{CompletionProvider, ConfigProvider, Pipeline, Storage, WebSearcher};
pub use crate::utils::error::Result;
