//! Event payloads carried on `data:` lines of the agent response

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a JSON array item by item, dropping items that do not fit `T`
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw.map(|items| {
        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::debug!("Ignoring undecodable stream item: {}", e);
                    None
                }
            })
            .collect()
    }))
}

/// One decoded `data:` payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamEvent {
    #[serde(default)]
    pub delta: Option<StreamDelta>,
}

impl StreamEvent {
    /// Content items in stream order (empty when the event carries none)
    pub fn content(&self) -> &[ContentItem] {
        self.delta
            .as_ref()
            .and_then(|d| d.content.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default, deserialize_with = "lenient_items")]
    pub content: Option<Vec<ContentItem>>,
}

/// A content item inside a delta
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        #[serde(default)]
        text: Option<String>,
    },
    ToolResults {
        #[serde(default)]
        tool_results: Option<ToolResults>,
    },
    /// Item types the gateway does not consume (tool_use, thinking, ...)
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolResults {
    #[serde(default, deserialize_with = "lenient_items")]
    pub content: Option<Vec<ToolResultItem>>,
}

impl ToolResults {
    pub fn items(&self) -> &[ToolResultItem] {
        self.content.as_deref().unwrap_or_default()
    }
}

/// One result produced by a tool invocation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolResultItem {
    #[serde(default)]
    pub json: Option<ToolResultPayload>,
}

impl ToolResultItem {
    /// Generated SQL, if the item carries one that is not blank
    pub fn sql(&self) -> Option<&str> {
        self.json
            .as_ref()
            .and_then(|j| j.sql.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Search hits in result order
    pub fn search_hits(&self) -> &[SearchHit] {
        self.json
            .as_ref()
            .and_then(|j| j.search_results.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolResultPayload {
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default, rename = "searchResults", deserialize_with = "lenient_items")]
    pub search_results: Option<Vec<SearchHit>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tool_results_event() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"delta":{"content":[
                {"type":"tool_use","tool_use":{"name":"supply_chain"}},
                {"type":"tool_results","tool_results":{"content":[
                    {"type":"json","json":{"sql":"SELECT 1","searchResults":[{"text":"doc"}]}}
                ]}}
            ]}}"#,
        )
        .unwrap();

        let content = event.content();
        assert_eq!(content.len(), 2);
        assert!(matches!(content[0], ContentItem::Other));
        match &content[1] {
            ContentItem::ToolResults {
                tool_results: Some(tool_results),
            } => {
                let item = &tool_results.items()[0];
                assert_eq!(item.sql(), Some("SELECT 1"));
                assert_eq!(item.search_hits()[0].text.as_deref(), Some("doc"));
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn test_event_without_delta_has_no_content() {
        let event: StreamEvent = serde_json::from_str(r#"{"id":"msg_1"}"#).unwrap();
        assert!(event.content().is_empty());
    }

    #[test]
    fn test_empty_sql_is_ignored() {
        let item: ToolResultItem = serde_json::from_str(r#"{"json":{"sql":""}}"#).unwrap();
        assert_eq!(item.sql(), None);
        assert!(item.search_hits().is_empty());

        let item: ToolResultItem = serde_json::from_str(r#"{"json":{"sql":"  \n"}}"#).unwrap();
        assert_eq!(item.sql(), None);
    }

    #[test]
    fn test_malformed_items_do_not_discard_siblings() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"delta":{"content":[
                {"text":"x"},
                {"type":"text","text":5},
                {"type":"text","text":"hi"},
                {"type":"tool_results","tool_results":{"content":[
                    {"json":"not an object"},
                    {"json":{"searchResults":[{"text":7},{"text":"doc"}]}}
                ]}}
            ]}}"#,
        )
        .unwrap();

        let content = event.content();
        assert_eq!(content.len(), 2);
        assert!(matches!(
            &content[0],
            ContentItem::Text { text: Some(t) } if t == "hi"
        ));
        match &content[1] {
            ContentItem::ToolResults {
                tool_results: Some(tool_results),
            } => {
                assert_eq!(tool_results.items().len(), 1);
                let hits = tool_results.items()[0].search_hits();
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].text.as_deref(), Some("doc"));
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }
}
