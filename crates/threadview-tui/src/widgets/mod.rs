pub mod code_block;
pub mod helpers;
pub mod markdown;
pub mod message_view;
pub mod tool_calls;
pub mod tool_result;
pub mod transcript;

pub use code_block::{CopyButton, CopyOutcome, IgnoreReason};
pub use markdown::{CodeBlock, MarkdownStyles, MarkedLine, MarkedText, RenderContext};
pub use message_view::MarkdownMessageView;
pub use tool_calls::ToolCallsView;
pub use tool_result::ToolResultView;
pub use transcript::TranscriptView;
