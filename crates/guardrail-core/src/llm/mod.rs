//! Remote model invocation
//!
//! The core treats the model call as an opaque remote operation behind the
//! [`ModelInvoker`] trait. [`HttpInvoker`] is the shipped implementation for
//! OpenAI-compatible chat-completions endpoints.

mod http;
mod invoker;

pub use http::{HttpInvoker, TimeoutConfig};
pub use invoker::{Completion, InvokeError, ModelInvoker, TokenUsage};
