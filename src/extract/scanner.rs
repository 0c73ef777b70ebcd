// src/extract/scanner.rs
// =============================================================================
// A streaming scanner that pulls link candidates out of raw response bytes.
//
// We don't parse HTML here. API responses embed absolute URLs anywhere (JSON
// values, HTML attributes, plain text), so we look for the raw hostname bytes
// and cut a candidate from there up to the first whitespace or '"'.
//
// How it works:
// 1. feed() appends a chunk of the body to an internal buffer
// 2. Search forward for the hostname pattern
// 3. Once found, walk forward one code point at a time looking for the end
// 4. Emit the candidate and continue after the terminator
// 5. finish() drops a candidate still open when the body ends, since it
//    never reached a terminator
//
// The scanner keeps cursor state between calls so it never scans the same
// bytes twice, and it throws away everything that can no longer be part of a
// candidate. Memory is bounded by the longest single candidate, which is in
// turn capped by `max_buffer`.
// =============================================================================

use crate::error::ScanError;

pub struct LinkScanner {
    pattern: Vec<u8>,
    buffer: Vec<u8>,
    /// Start of the hostname occurrence we are currently extending
    span_start: Option<usize>,
    /// Where the next search (for the pattern or a terminator) resumes
    cursor: usize,
    max_buffer: usize,
}

impl LinkScanner {
    pub fn new(hostname: &[u8], max_buffer: usize) -> Self {
        Self {
            pattern: hostname.to_vec(),
            buffer: Vec::with_capacity(64 * 1024),
            span_start: None,
            cursor: 0,
            max_buffer,
        }
    }

    /// Appends `chunk` and calls `emit` once per complete candidate.
    ///
    /// Returns `ScanError::TokenTooLong` when an open candidate grows past the
    /// buffer ceiling. Candidates emitted before that point are still valid.
    pub fn feed<F>(&mut self, chunk: &[u8], emit: F) -> Result<(), ScanError>
    where
        F: FnMut(&[u8]),
    {
        self.buffer.extend_from_slice(chunk);
        self.process(false, emit);

        // After compaction an open candidate starts at offset 0
        if self.span_start.is_some() && self.buffer.len() > self.max_buffer {
            return Err(ScanError::TokenTooLong {
                limit: self.max_buffer,
            });
        }
        Ok(())
    }

    /// Signals the end of the stream. A candidate that never reached a
    /// terminator is dropped.
    pub fn finish<F>(&mut self, emit: F)
    where
        F: FnMut(&[u8]),
    {
        self.process(true, emit);

        self.span_start = None;
        self.buffer.clear();
        self.cursor = 0;
    }

    fn process<F>(&mut self, at_eof: bool, mut emit: F)
    where
        F: FnMut(&[u8]),
    {
        // Everything before `head` has been consumed and can be dropped
        let head;

        loop {
            match self.span_start {
                None => match find(&self.buffer[self.cursor..], &self.pattern) {
                    Some(offset) => {
                        let start = self.cursor + offset;
                        self.span_start = Some(start);
                        self.cursor = start + self.pattern.len();
                    }
                    None => {
                        // Only a tail shorter than the pattern can still start a
                        // match that straddles the next chunk.
                        let keep = self.pattern.len().saturating_sub(1);
                        self.cursor = self.cursor.max(self.buffer.len().saturating_sub(keep));
                        head = self.cursor;
                        break;
                    }
                },
                Some(start) => match find_end(&self.buffer, self.cursor, at_eof) {
                    End::Found { at, width } => {
                        emit(&self.buffer[start..at]);
                        self.span_start = None;
                        self.cursor = at + width;
                    }
                    End::NeedMore { resume } => {
                        self.cursor = resume;
                        head = start;
                        break;
                    }
                },
            }
        }

        self.compact(head);
    }

    fn compact(&mut self, head: usize) {
        if head == 0 {
            return;
        }
        self.buffer.drain(..head);
        self.cursor -= head;
        if let Some(start) = self.span_start.as_mut() {
            *start -= head;
        }
    }

    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

enum End {
    /// Terminator code point starts at `at` and is `width` bytes long
    Found { at: usize, width: usize },
    /// No terminator yet; resume from `resume` once more bytes arrive
    NeedMore { resume: usize },
}

/// Walks `data` from `from` one code point at a time looking for whitespace
/// or a double quote. A multi-byte character cut off by the end of the buffer
/// is left for the next call instead of being decoded in halves.
fn find_end(data: &[u8], from: usize, at_eof: bool) -> End {
    let mut i = from;

    while i < data.len() {
        let byte = data[i];

        if byte.is_ascii() {
            if byte == b'"' || (byte as char).is_whitespace() {
                return End::Found { at: i, width: 1 };
            }
            i += 1;
            continue;
        }

        let width = utf8_width(byte);
        if width == 0 {
            // Stray continuation byte or invalid lead byte
            i += 1;
            continue;
        }
        if i + width > data.len() {
            if at_eof {
                i += 1;
                continue;
            }
            return End::NeedMore { resume: i };
        }

        match std::str::from_utf8(&data[i..i + width]) {
            Ok(decoded) => {
                if decoded.chars().next().is_some_and(char::is_whitespace) {
                    return End::Found { at: i, width };
                }
                i += width;
            }
            Err(_) => i += 1,
        }
    }

    End::NeedMore { resume: i }
}

fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &[u8] = b"example.com";

    // Feeds `chunks` in order and collects every candidate as a String
    fn scan(chunks: &[&[u8]]) -> Vec<String> {
        let mut scanner = LinkScanner::new(HOST, 1024);
        let mut spans = Vec::new();
        for chunk in chunks {
            scanner
                .feed(chunk, |span| spans.push(String::from_utf8_lossy(span).into_owned()))
                .unwrap();
        }
        scanner.finish(|span| spans.push(String::from_utf8_lossy(span).into_owned()));
        spans
    }

    #[test]
    fn test_extracts_until_whitespace_or_quote() {
        let body = br#"{"self": "https://example.com/v3/a", "next": "https://example.com/v3/b?action=x"}
see example.com/plain here"#;
        assert_eq!(
            scan(&[body]),
            vec![
                "example.com/v3/a",
                "example.com/v3/b?action=x",
                "example.com/plain",
            ]
        );
    }

    #[test]
    fn test_no_host_yields_nothing() {
        assert!(scan(&[b"nothing to see at other.org/page\n"]).is_empty());
        assert!(scan(&[]).is_empty());
    }

    #[test]
    fn test_host_split_across_chunks() {
        assert_eq!(
            scan(&[b"go to https://exam", b"ple.com/a next"]),
            vec!["example.com/a"]
        );
    }

    #[test]
    fn test_unterminated_span_dropped_on_finish() {
        assert!(scan(&[b"{\"a\": 1} see example.com/b?action=x"]).is_empty());
        assert_eq!(
            scan(&[b"example.com/done example.com/tail"]),
            vec!["example.com/done"]
        );
    }

    #[test]
    fn test_finish_resets_for_reuse() {
        let mut scanner = LinkScanner::new(HOST, 1024);
        scanner.feed(b"example.com/open", |_| panic!("no span expected")).unwrap();
        scanner.finish(|_| panic!("open span must not be emitted"));
        assert_eq!(scanner.buffered(), 0);
    }

    #[test]
    fn test_unicode_whitespace_terminates() {
        // U+3000 IDEOGRAPHIC SPACE is three bytes, split over two chunks
        let spans = scan(&[b"example.com/a\xE3\x80", b"\x80example.com/b\x0Bz"]);
        assert_eq!(spans, vec!["example.com/a", "example.com/b"]);
    }

    #[test]
    fn test_multibyte_chars_stay_inside_span() {
        assert_eq!(
            scan(&["example.com/caf\u{e9}/x\tend".as_bytes()]),
            vec!["example.com/caf\u{e9}/x"]
        );
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let body = "a example.com/one \"example.com/two\"\u{a0}example.com/thr\u{e9}e\nzz example.com/four\n";
        let bytes = body.as_bytes();
        let whole = scan(&[bytes]);

        for size in [1, 2, 3, 7] {
            let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
            assert_eq!(scan(&chunks), whole, "chunk size {}", size);
        }
        assert_eq!(whole.len(), 4);
    }

    #[test]
    fn test_spans_start_with_host_and_have_no_terminators() {
        let body = b"example.com example.com/a\"example.com/b\r\nexample.com?x=1 \"\"";
        for span in scan(&[body]) {
            assert!(span.starts_with("example.com"));
            assert!(!span.chars().any(|c| c.is_whitespace() || c == '"'));
        }
    }

    #[test]
    fn test_non_matching_bytes_are_discarded() {
        let mut scanner = LinkScanner::new(HOST, 1024);
        let filler = vec![b'x'; 10_000];
        scanner.feed(&filler, |_| panic!("no span expected")).unwrap();
        assert!(scanner.buffered() < HOST.len());
    }

    #[test]
    fn test_ceiling_aborts_long_span() {
        let mut scanner = LinkScanner::new(HOST, 32);
        let mut spans = Vec::new();
        scanner
            .feed(b"example.com/ok ", |span| spans.push(span.to_vec()))
            .unwrap();

        let long = [b"example.com/".as_slice(), &[b'a'; 64]].concat();
        let result = scanner.feed(&long, |span| spans.push(span.to_vec()));

        assert_eq!(result, Err(ScanError::TokenTooLong { limit: 32 }));
        assert_eq!(spans, vec![b"example.com/ok".to_vec()]);
    }
}
