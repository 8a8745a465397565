//! Request document sent to the Cortex agent endpoint

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::CortexSettings;

/// Kind of tool offered to the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToolKind {
    #[serde(rename = "cortex_search")]
    Search,
    #[serde(rename = "cortex_analyst_text_to_sql")]
    TextToSql,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolEntry {
    pub tool_spec: ToolSpec,
}

/// Resource binding for one tool, keyed by tool name in the request
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolResource {
    Search {
        name: String,
        max_results: u32,
        title_column: String,
        id_column: String,
    },
    SemanticModel {
        #[serde(skip_serializing_if = "Option::is_none")]
        semantic_model_file: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        semantic_view: Option<String>,
    },
}

/// Fixed declaration of tools offered on every request
#[derive(Debug, Clone)]
pub struct ToolManifest {
    model: String,
    tools: Vec<ToolEntry>,
    resources: BTreeMap<String, ToolResource>,
}

impl ToolManifest {
    /// Hybrid search + text-to-SQL manifest built from settings
    pub fn from_settings(settings: &CortexSettings) -> Self {
        let tools = vec![
            ToolEntry {
                tool_spec: ToolSpec {
                    kind: ToolKind::Search,
                    name: settings.search_tool_name.clone(),
                },
            },
            ToolEntry {
                tool_spec: ToolSpec {
                    kind: ToolKind::TextToSql,
                    name: settings.analyst_tool_name.clone(),
                },
            },
        ];

        let mut resources = BTreeMap::new();
        resources.insert(
            settings.search_tool_name.clone(),
            ToolResource::Search {
                name: settings.search_service.clone(),
                max_results: settings.search_max_results,
                title_column: settings.search_title_column.clone(),
                id_column: settings.search_id_column.clone(),
            },
        );
        resources.insert(
            settings.analyst_tool_name.clone(),
            ToolResource::SemanticModel {
                semantic_model_file: settings.semantic_model_file.clone(),
                semantic_view: settings.semantic_view.clone(),
            },
        );

        Self {
            model: settings.model.clone(),
            tools,
            resources,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &[ToolEntry] {
        &self.tools
    }

    /// Build the request for one prompt
    pub fn request<'a>(&'a self, prompt: &'a str) -> AgentRequest<'a> {
        AgentRequest {
            model: &self.model,
            messages: vec![AgentMessage::user(prompt)],
            tools: &self.tools,
            tool_resources: &self.resources,
            tool_choice: ToolChoice { kind: "auto" },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageContent<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentMessage<'a> {
    pub role: &'static str,
    pub content: Vec<MessageContent<'a>>,
}

impl<'a> AgentMessage<'a> {
    pub fn user(text: &'a str) -> Self {
        Self {
            role: "user",
            content: vec![MessageContent { kind: "text", text }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Body of one `agent:run` call
#[derive(Debug, Clone, Serialize)]
pub struct AgentRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<AgentMessage<'a>>,
    pub tools: &'a [ToolEntry],
    pub tool_resources: &'a BTreeMap<String, ToolResource>,
    pub tool_choice: ToolChoice,
}
