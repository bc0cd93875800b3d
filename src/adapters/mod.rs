// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod openai;
pub mod serpapi;
pub mod sse;
pub mod storage;
