//! Channel layer for output accumulation and pattern matching.
//!
//! This module turns the raw byte stream of a PTY into clean text:
//! terminal control sequences are interpreted and dropped as they arrive,
//! and the tail of the accumulated output is searched for prompts and
//! pager markers.

mod ansi;
mod buffer;
mod patterns;

pub use buffer::PatternBuffer;
pub use patterns::compile_prompt_pattern;
