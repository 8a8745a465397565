use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row: column name to scalar value, in result-schema order
pub type Row = Map<String, Value>;

/// Fields extracted from one agent response stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOutcome {
    /// Narrative text, concatenated in stream order
    pub text: String,
    /// Last generated query seen in the stream
    pub sql: String,
    /// Search hit text, newline separated
    pub citations: String,
    #[serde(skip)]
    citation_count: usize,
}

impl ParsedOutcome {
    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Later queries replace earlier ones
    pub fn record_sql(&mut self, sql: &str) {
        self.sql.clear();
        self.sql.push_str(sql);
    }

    /// Every hit takes one line, including hits with empty text
    pub fn push_citation(&mut self, text: &str) {
        if self.citation_count > 0 {
            self.citations.push('\n');
        }
        self.citations.push_str(text);
        self.citation_count += 1;
    }

    pub fn has_sql(&self) -> bool {
        !self.sql.trim().is_empty()
    }
}

/// Rows returned by the warehouse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResult {
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Final result of one orchestrated prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub text: String,
    pub sql: String,
    pub citations: String,
    pub table: QueryResult,
}

impl AgentResponse {
    pub fn new(outcome: ParsedOutcome, table: QueryResult) -> Self {
        Self {
            text: outcome.text,
            sql: outcome.sql,
            citations: outcome.citations,
            table,
        }
    }
}
