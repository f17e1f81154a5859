//! Pattern buffer with efficient tail-search optimization.
//!
//! Only the last N bytes of the buffer are searched for prompt and pager
//! patterns, rather than the entire output. For long routing tables this
//! keeps every check O(search_depth).

use regex::bytes::Regex;

use super::ansi::TerminalFilter;

/// Buffer for accumulating output and efficiently searching for patterns.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated output buffer.
    buffer: Vec<u8>,

    /// Terminal filter applied to incoming bytes.
    filter: TerminalFilter,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Raw bytes received, before filtering.
    received: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            filter: TerminalFilter::new(),
            search_depth,
            received: 0,
        }
    }

    /// Extend the buffer with new data, interpreting terminal controls.
    pub fn extend(&mut self, data: &[u8]) {
        self.received += data.len();
        self.filter.feed(data, &mut self.buffer);
    }

    /// Search only the tail of the buffer for the pattern.
    ///
    /// Returns the match with byte offsets relative to the start of the
    /// search region (not the full buffer).
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        pattern.find(&self.buffer[self.tail_start()..])
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Remove everything from the start of a tail match to the end.
    ///
    /// Returns whether anything matched.
    pub fn truncate_tail_match(&mut self, pattern: &Regex) -> bool {
        let start = self.tail_start();
        match pattern.find(&self.buffer[start..]) {
            Some(m) => {
                self.buffer.truncate(start + m.start());
                true
            }
            None => false,
        }
    }

    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.received = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Raw bytes received since the last take/clear, before filtering.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.received = 0;
        self.buffer.clear();
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
        assert_eq!(buffer.received(), 13);
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nrouter#");

        let pattern = Regex::new(r"router#").unwrap();
        assert!(buffer.search_tail(&pattern).is_some());
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"router#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"router#").unwrap();
        assert!(!buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_truncate_tail_match() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"C    10.0.0.0/24 is directly connected\n --More-- ");

        let pager = Regex::new(r" ?--More--\s*$").unwrap();
        assert!(buffer.truncate_tail_match(&pager));
        assert_eq!(buffer.as_slice(), b"C    10.0.0.0/24 is directly connected\n");
        assert!(!buffer.truncate_tail_match(&pager));
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.as_slice().is_empty());
        assert_eq!(buffer.received(), 0);
    }
}
