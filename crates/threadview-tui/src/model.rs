//! Message records as produced by the agent backend.
//!
//! The schema follows the LangGraph message shape: AI messages carry
//! `tool_calls`, tool messages carry `tool_call_id` and a text `content` that
//! may itself be JSON-encoded.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "args_or_empty")]
    pub args: Map<String, Value>,
}

/// The output of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "toolCallId",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_call_id: Option<String>,
    #[serde(default, deserialize_with = "content_as_text")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "message_text")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "message_text")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    #[serde(alias = "user")]
    Human(TextMessage),
    #[serde(alias = "assistant")]
    Ai(AiMessage),
    Tool(ToolResultRecord),
    System(TextMessage),
}

impl Message {
    pub fn id(&self) -> Option<&str> {
        match self {
            Message::Human(msg) | Message::System(msg) => msg.id.as_deref(),
            Message::Ai(msg) => msg.id.as_deref(),
            Message::Tool(msg) => msg.id.as_deref(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::Human(msg) | Message::System(msg) => &msg.content,
            Message::Ai(msg) => &msg.content,
            Message::Tool(msg) => &msg.content,
        }
    }

    /// Tool calls requested by this message; empty for non-AI messages.
    pub fn tool_calls(&self) -> &[ToolCallRecord] {
        match self {
            Message::Ai(msg) => &msg.tool_calls,
            _ => &[],
        }
    }
}

/// An ordered list of messages in one conversation thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Bare(Vec<Message>),
    Wrapped { messages: Vec<Message> },
}

impl<'de> Deserialize<'de> for Transcript {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let messages = match TranscriptFile::deserialize(deserializer)? {
            TranscriptFile::Bare(messages) | TranscriptFile::Wrapped { messages } => messages,
        };
        Ok(Self { messages })
    }
}

impl Transcript {
    /// Parse a transcript from a JSON array of messages or an object with a
    /// `messages` array.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let transcript = Self::from_json(&contents)?;
        debug!(
            target: "threadview.transcript",
            path = %path.display(),
            messages = transcript.messages.len(),
            "Loaded transcript"
        );
        Ok(transcript)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Find the result message answering a tool call.
    pub fn tool_result_for(&self, tool_call_id: &str) -> Option<&ToolResultRecord> {
        self.messages.iter().find_map(|message| match message {
            Message::Tool(result) if result.tool_call_id.as_deref() == Some(tool_call_id) => {
                Some(result)
            }
            _ => None,
        })
    }
}

/// Tool content is text; structured content is kept as its JSON encoding so
/// it is classified like any other JSON payload.
fn content_as_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Human and AI content may arrive as a list of content blocks; the text
/// blocks are joined and anything else is dropped.
fn message_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                Value::String(text) => Some(text.as_str()),
                Value::Object(fields) => fields.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn args_or_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_langgraph_messages() {
        let transcript = Transcript::from_json(
            &json!([
                {"type": "human", "content": "list files"},
                {
                    "type": "ai",
                    "id": "run-1",
                    "content": "",
                    "tool_calls": [{"name": "ls", "args": {"path": "/tmp", "all": true}, "id": "call_1"}]
                },
                {"type": "tool", "name": "ls", "tool_call_id": "call_1", "content": "[\"a\",\"b\"]"}
            ])
            .to_string(),
        )
        .unwrap();

        assert_eq!(transcript.len(), 3);
        let calls = transcript.messages[1].tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "ls");
        assert_eq!(calls[0].id.as_deref(), Some("call_1"));
        let keys: Vec<&String> = calls[0].args.keys().collect();
        assert_eq!(keys, ["path", "all"]);

        let result = transcript.tool_result_for("call_1").unwrap();
        assert_eq!(result.name.as_deref(), Some("ls"));
        assert_eq!(result.content, "[\"a\",\"b\"]");
    }

    #[test]
    fn test_wrapped_transcript_and_aliases() {
        let transcript = Transcript::from_json(
            r#"{"messages": [
                {"type": "user", "content": "hi"},
                {"type": "assistant", "content": "hello"}
            ]}"#,
        )
        .unwrap();

        assert!(matches!(transcript.messages[0], Message::Human(_)));
        assert!(matches!(transcript.messages[1], Message::Ai(_)));
        assert!(transcript.messages[1].tool_calls().is_empty());
    }

    #[test]
    fn test_structured_tool_content_becomes_json_text() {
        let message: Message = serde_json::from_value(json!({
            "type": "tool",
            "toolCallId": "c1",
            "content": {"ok": true}
        }))
        .unwrap();

        let Message::Tool(result) = message else {
            panic!("expected tool message");
        };
        assert_eq!(result.tool_call_id.as_deref(), Some("c1"));
        assert_eq!(result.content, r#"{"ok":true}"#);
        assert!(result.name.is_none());
    }

    #[test]
    fn test_content_blocks_and_null_fields() {
        let message: Message = serde_json::from_value(json!({
            "type": "ai",
            "content": [{"type": "text", "text": "first"}, {"type": "image_url"}, {"type": "text", "text": "second"}],
            "tool_calls": null
        }))
        .unwrap();

        assert_eq!(message.content(), "first\nsecond");
        assert!(message.tool_calls().is_empty());

        let call: ToolCallRecord =
            serde_json::from_value(json!({"name": "noop", "args": null})).unwrap();
        assert!(call.args.is_empty());
        assert!(call.id.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thread.json");
        std::fs::write(&path, r#"[{"type": "system", "content": "be brief"}]"#).unwrap();

        let transcript = Transcript::load(&path).unwrap();
        assert_eq!(transcript.messages[0].content(), "be brief");
    }

    #[test]
    fn test_invalid_transcript_is_an_error() {
        assert!(Transcript::from_json("{\"messages\": 3}").is_err());
        assert!(Transcript::load(Path::new("/nonexistent/thread.json")).is_err());
    }
}
