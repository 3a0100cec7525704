/// Buffers raw bytes from a TCP stream and yields complete, newline-stripped lines.
///
/// A streamed `COPY … TO STDOUT` delivers bytes in arbitrary chunk boundaries that
/// don't align with line boundaries. `LineBuffer` holds the tail of one chunk across
/// calls to [`LineBuffer::push`] so [`parse_line`](crate::parse_line) is never
/// invoked on a partial line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes, returning every complete line it produced (including
    /// lines carried over from a prior chunk). The final, possibly partial, segment
    /// is retained for the next call.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let line = self.pending[..pos].to_string();
            self.pending.drain(..=pos);
            lines.push(line);
        }
        lines
    }

    /// Whether a partial line is currently held, awaiting more bytes.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_with_trailing_newline_yields_all_lines() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push("a\tb\nc\td\n");
        assert_eq!(lines, vec!["a\tb", "c\td"]);
        assert!(!buffer.has_pending());
    }

    #[test]
    fn line_split_across_chunk_boundary_is_reassembled() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push("a\tb").is_empty());
        assert!(buffer.has_pending());

        let lines = buffer.push("\tc\n");
        assert_eq!(lines, vec!["a\tb\tc"]);
        assert!(!buffer.has_pending());
    }

    #[test]
    fn chunk_with_no_newline_yields_nothing_and_retains_pending() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push("partial").is_empty());
        assert!(buffer.has_pending());
    }

    #[test]
    fn multiple_pushes_accumulate_across_several_partial_chunks() {
        let mut buffer = LineBuffer::new();
        buffer.push("a");
        buffer.push("b");
        let lines = buffer.push("c\n");
        assert_eq!(lines, vec!["abc"]);
    }
}
