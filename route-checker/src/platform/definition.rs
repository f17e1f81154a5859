//! Platform definition for vendor-specific session behaviour.

use regex::bytes::Regex;

use super::DeviceKind;

/// Platform definition containing the session behaviour of one dialect.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Dialect this definition belongs to.
    pub kind: DeviceKind,

    /// Pattern matching the CLI prompt at the end of the buffer.
    pub prompt_pattern: Regex,

    /// Pattern matching a pagination marker at the end of the buffer.
    pub pager_pattern: Option<Regex>,

    /// Input sent to dismiss the pager.
    pub pager_advance: String,

    /// Patterns that indicate the device rejected a command.
    pub failed_when_contains: Vec<String>,

    /// Commands run once during session preparation.
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with a prompt pattern.
    pub fn new(kind: DeviceKind, prompt_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            prompt_pattern: Regex::new(prompt_pattern)?,
            pager_pattern: None,
            pager_advance: " ".to_string(),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        })
    }

    /// Set the pager pattern.
    pub fn with_pager(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pager_pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Return the first failure marker contained in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }
}
