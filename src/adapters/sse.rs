//! Server-sent-events decoding for streamed chat completions.
//!
//! Turns the raw response byte stream into [`CompletionChunk`]s. Lines are
//! split on raw bytes so multi-byte characters cut across network frames
//! survive intact. The stream ends at `data: [DONE]` or when the body ends.

use bytes::Bytes;
use futures::stream::Stream;
use serde::Deserialize;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::domain::model::CompletionChunk;
use crate::utils::error::{EtlError, Result};

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct RawChunk {
    #[serde(default)]
    choices: Vec<RawChoice>,
    #[serde(default)]
    error: Option<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    #[serde(default)]
    delta: RawDelta,
}

#[derive(Debug, Default, Deserialize)]
struct RawDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    message: String,
}

pub struct SseChunkStream<S> {
    inner: Pin<Box<S>>,
    buffer: Vec<u8>,
    finished: bool,
}

impl<S> SseChunkStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>>,
{
    pub fn new(byte_stream: S) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: Vec::new(),
            finished: false,
        }
    }
}

enum LineOutcome {
    Chunk(CompletionChunk),
    Done,
    Skip,
}

fn parse_line(raw: &[u8]) -> Result<LineOutcome> {
    let line = std::str::from_utf8(raw).map_err(|e| EtlError::StreamError {
        message: format!("Invalid UTF-8 in stream: {}", e),
    })?;
    let line = line.trim();

    // 空行是事件分隔，event:/id:/retry: 之類的欄位不需要
    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(LineOutcome::Skip);
    };
    let data = data.trim();

    if data == DONE_MARKER {
        return Ok(LineOutcome::Done);
    }

    let raw: RawChunk = serde_json::from_str(data).map_err(|e| EtlError::StreamError {
        message: format!(
            "Failed to parse stream chunk: {} (data: {})",
            e,
            data.chars().take(200).collect::<String>()
        ),
    })?;

    if let Some(error) = raw.error {
        return Err(EtlError::LlmError {
            message: error.message,
        });
    }

    let delta = raw.choices.into_iter().next().and_then(|c| c.delta.content);
    Ok(LineOutcome::Chunk(CompletionChunk { delta }))
}

impl<S> SseChunkStream<S> {
    /// Pops complete lines off the buffer until one yields an item.
    fn next_buffered(&mut self) -> Option<Result<CompletionChunk>> {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            match parse_line(&line) {
                Ok(LineOutcome::Chunk(chunk)) => return Some(Ok(chunk)),
                Ok(LineOutcome::Done) => {
                    self.finished = true;
                    self.buffer.clear();
                    return None;
                }
                Ok(LineOutcome::Skip) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl<S> Stream for SseChunkStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>>,
{
    type Item = Result<CompletionChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            if let Some(item) = this.next_buffered() {
                return Poll::Ready(Some(item));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(EtlError::ApiError(e))));
                }
                Poll::Ready(None) => {
                    // 最後一行可能沒有換行
                    this.finished = true;
                    if this.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    let rest = std::mem::take(&mut this.buffer);
                    return match parse_line(&rest) {
                        Ok(LineOutcome::Chunk(chunk)) => Poll::Ready(Some(Ok(chunk))),
                        Ok(_) => Poll::Ready(None),
                        Err(e) => Poll::Ready(Some(Err(e))),
                    };
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn frames(parts: &[&str]) -> Vec<std::result::Result<Bytes, reqwest::Error>> {
        parts
            .iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect()
    }

    async fn collect(parts: &[&str]) -> Vec<Result<CompletionChunk>> {
        let stream = SseChunkStream::new(futures::stream::iter(frames(parts)));
        stream.collect().await
    }

    #[tokio::test]
    async fn test_parse_multiple_tokens() {
        let items = collect(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Jane\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" Doe\"}}]}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;

        let deltas: Vec<Option<String>> = items.into_iter().map(|c| c.unwrap().delta).collect();
        assert_eq!(deltas, vec![Some("Jane".to_string()), Some(" Doe".to_string())]);
    }

    #[tokio::test]
    async fn test_line_split_across_frames() {
        let items = collect(&[
            "data: {\"choices\":[{\"delta\":{\"con",
            "tent\":\"Principal\"}}]}\n",
            "\ndata: [DONE]\n",
        ])
        .await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().delta.as_deref(), Some("Principal"));
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_frames() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"José\"}}]}\n";
        let bytes = line.as_bytes();
        // 在 é 的兩個位元組中間切開
        let cut = line.find('é').unwrap() + 1;
        let parts: Vec<std::result::Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::copy_from_slice(&bytes[..cut])),
            Ok(Bytes::copy_from_slice(&bytes[cut..])),
        ];

        let stream = SseChunkStream::new(futures::stream::iter(parts));
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().delta.as_deref(), Some("José"));
    }

    #[tokio::test]
    async fn test_empty_delta_and_ignored_fields() {
        let items = collect(&[
            ": keep-alive\n",
            "event: message\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[]}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|c| c.as_ref().unwrap().delta.is_none()));
    }

    #[tokio::test]
    async fn test_stops_at_done_marker() {
        let items = collect(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
            "data: [DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n",
        ])
        .await;

        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let items = collect(&["data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}"]).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().delta.as_deref(), Some("tail"));
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_error_and_ends_stream() {
        let items = collect(&[
            "data: {not json}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        ])
        .await;

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(EtlError::StreamError { .. })));
    }

    #[tokio::test]
    async fn test_inline_error_object() {
        let items = collect(&["data: {\"error\":{\"message\":\"Rate limit reached\"}}\n"]).await;

        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(EtlError::LlmError { message }) => assert_eq!(message, "Rate limit reached"),
            other => panic!("unexpected item: {:?}", other),
        }
    }
}
