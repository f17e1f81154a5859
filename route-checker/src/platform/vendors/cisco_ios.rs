//! Cisco IOS platform definition.
//!
//! Only the operational prompts are of interest here; the capture never
//! leaves EXEC or privileged EXEC mode.
//!
//! # Prompt Examples
//!
//! ```text
//! router>                  # user EXEC
//! router#                  # privileged EXEC
//! core-rtr-01.lab#         # dotted hostnames
//! ```
//!
//! Preparation mirrors what an operator types by hand before scraping:
//! widen the terminal and turn pagination off. The pager pattern still
//! exists for devices that ignore `terminal length 0` (some AAA setups
//! reset it per session).

use crate::platform::{DeviceKind, PlatformDefinition};

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(DeviceKind::CiscoIos, r"(?:^|\n)[\w.\-@/:()]{1,63}[>#]\s*$")
        .unwrap()
        .with_pager(r"(?i) ?--\s?more\s?--\s*$")
        .unwrap()
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Unknown command")
        .with_failure_pattern("% Authorization failed")
        .with_on_open_command("terminal width 511")
        .with_on_open_command("terminal length 0")
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cisco_ios_platform() {
        let platform = platform();
        assert_eq!(platform.kind, DeviceKind::CiscoIos);
        assert_eq!(
            platform.on_open_commands,
            vec!["terminal width 511".to_string(), "terminal length 0".to_string()]
        );
        assert_eq!(platform.terminal_width, 511);
    }

    #[test]
    fn test_prompt_match() {
        let platform = platform();
        let prompt = &platform.prompt_pattern;

        assert!(prompt.is_match(b"router>"));
        assert!(prompt.is_match(b"router#"));
        assert!(prompt.is_match(b"router# "));
        assert!(prompt.is_match(b"some output\ncore-rtr-01.lab#"));

        // Only the last line counts
        assert!(!prompt.is_match(b"router#\nshow ip route"));

        // Route lines never look like a prompt
        assert!(!prompt.is_match(b"S*    0.0.0.0/0 [1/0] via 10.0.0.1"));
        assert!(!prompt.is_match(b"Gateway of last resort is not set"));
    }

    #[test]
    fn test_pager_match() {
        let platform = platform();
        let pager = platform.pager_pattern.as_ref().unwrap();

        assert!(pager.is_match(b"C    10.0.0.0/24 is directly connected\n --More-- "));
        assert!(pager.is_match(b" --More--"));
        assert!(!pager.is_match(b" --More-- \nO    192.168.1.0/24 via 10.0.0.1"));
    }

    #[test]
    fn test_failure_patterns() {
        let platform = platform();
        assert_eq!(
            platform.detect_failure("   ^\n% Invalid input detected at '^' marker."),
            Some("% Invalid input")
        );
        assert_eq!(platform.detect_failure("router#"), None);
    }
}
