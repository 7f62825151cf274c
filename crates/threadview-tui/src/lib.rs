pub mod clipboard;
pub mod config;
pub mod content;
pub mod error;
pub mod highlight;
pub mod model;
pub mod theme;
pub mod throttle;
pub mod widgets;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{Message, ToolCallRecord, ToolResultRecord, Transcript};
pub use theme::{Component, Theme};
pub use throttle::{Throttle, ThrottleOutcome, ThrottledText};
