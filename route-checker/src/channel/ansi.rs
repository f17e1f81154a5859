//! Terminal control filtering built on the `vte` state machine.

use vte::{Parser, Perform};

/// Streaming filter that drops escape sequences from PTY output.
///
/// The parser state survives between calls, so an escape sequence split
/// across two SSH packets is still removed. Carriage returns are dropped
/// (normalising `\r\n` to `\n`) and a backspace erases the previous
/// character on the current line, which is how devices wipe a pager marker.
pub(crate) struct TerminalFilter {
    parser: Parser,
}

impl TerminalFilter {
    /// Create a new filter.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Feed `data` through the filter, appending printable output to `out`.
    pub fn feed(&mut self, data: &[u8], out: &mut Vec<u8>) {
        let mut sink = Sink { out };
        self.parser.advance(&mut sink, data);
    }
}

impl Default for TerminalFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TerminalFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalFilter").finish_non_exhaustive()
    }
}

struct Sink<'a> {
    out: &'a mut Vec<u8>,
}

impl Perform for Sink<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\t' => self.out.push(byte),
            0x08 => {
                if self.out.last().is_some_and(|b| *b != b'\n') {
                    self.out.pop();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(chunks: &[&[u8]]) -> String {
        let mut filter = TerminalFilter::new();
        let mut out = Vec::new();
        for chunk in chunks {
            filter.feed(chunk, &mut out);
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_strips_colour_codes() {
        assert_eq!(filter(&[b"\x1b[32mGreen text\x1b[0m"]), "Green text");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        assert_eq!(filter(&[b"before\x1b[", b"0mafter"]), "beforeafter");
    }

    #[test]
    fn test_crlf_normalised() {
        assert_eq!(filter(&[b"line one\r\nline two\r\n"]), "line one\nline two\n");
    }

    #[test]
    fn test_backspace_erases_on_current_line_only() {
        assert_eq!(filter(&[b"abc\x08\x08d"]), "ad");
        assert_eq!(filter(&[b"abc\n\x08\x08  \x08\x08S"]), "abc\nS");
    }
}
