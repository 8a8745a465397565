//! Incremental parser for the agent's `data:` event stream
//!
//! Every line is decoded on its own. Lines without the `data:` prefix, the `[DONE]`
//! terminator and payloads that fail to decode are skipped, so interleaved or
//! truncated tool output never prevents extraction of the rest of the stream.

use crate::domain::stream::{ContentItem, StreamEvent};
use crate::domain::ParsedOutcome;

/// Prefix of event lines
pub const DATA_PREFIX: &str = "data:";

/// Payload of the terminal event line
pub const DONE_SENTINEL: &str = "[DONE]";

/// Accumulates text, SQL and citations from a stream delivered in arbitrary chunks
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    buffer: String,
    outcome: ParsedOutcome,
    events: usize,
    skipped: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of body text; complete lines are processed immediately
    pub fn feed(&mut self, chunk: &str) {
        let mut pending = std::mem::take(&mut self.buffer);
        pending.push_str(chunk);

        let mut start = 0;
        while let Some(offset) = pending[start..].find('\n') {
            let end = start + offset;
            self.push_line(&pending[start..end]);
            start = end + 1;
        }

        // Keep only the trailing partial line
        pending.drain(..start);
        self.buffer = pending;
    }

    /// Process one complete line
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim_end_matches(['\n', '\r']);

        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };
        let payload = payload.strip_prefix(' ').unwrap_or(payload);

        if payload.trim() == DONE_SENTINEL {
            return;
        }

        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => {
                self.events += 1;
                self.apply(&event);
            }
            Err(e) => {
                self.skipped += 1;
                tracing::warn!("Skipping undecodable stream line: {}", e);
            }
        }
    }

    fn apply(&mut self, event: &StreamEvent) {
        for item in event.content() {
            match item {
                ContentItem::Text { text } => {
                    if let Some(text) = text {
                        self.outcome.push_text(text);
                    }
                }
                ContentItem::ToolResults {
                    tool_results: Some(results),
                } => {
                    for result in results.items() {
                        if let Some(sql) = result.sql() {
                            self.outcome.record_sql(sql);
                        }
                        for hit in result.search_hits() {
                            self.outcome.push_citation(hit.text.as_deref().unwrap_or_default());
                        }
                    }
                }
                ContentItem::ToolResults { tool_results: None } | ContentItem::Other => {}
            }
        }
    }

    /// Number of events decoded so far
    pub fn events(&self) -> usize {
        self.events
    }

    /// Number of `data:` lines that could not be decoded
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    /// Flush any trailing partial line and return the outcome
    pub fn finish(mut self) -> ParsedOutcome {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.push_line(&rest);
        }

        tracing::debug!(
            "Parsed {} stream events ({} skipped), sql present: {}",
            self.events,
            self.skipped,
            self.outcome.has_sql()
        );

        self.outcome
    }
}

/// Parse a complete response body
pub fn parse(raw: &str) -> ParsedOutcome {
    let mut accumulator = StreamAccumulator::new();
    accumulator.feed(raw);
    accumulator.finish()
}
