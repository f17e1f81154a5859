//! Pattern helpers for prompt detection.

use regex::bytes::Regex;

/// Compile a prompt pattern string into a regex.
///
/// Anchors to the end of the buffer if no anchor is given, so a prompt
/// string echoed inside command output does not count.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    Regex::new(&pattern)
}
