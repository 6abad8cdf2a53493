//! NDJSON chunk decoder for the model service's streamed response body.
//!
//! The service replies with newline-delimited JSON records, one per text
//! fragment: `{"response": "...", "done": false}`. A raw network read may
//! contain zero, one, or several records, and a record may be split at any
//! byte — including inside a multi-byte UTF-8 sequence — so the decoder
//! buffers raw bytes and only parses once a terminating newline arrives.
//!
//! Malformed records are skipped with a warning; the stream continues. A
//! record with `done: true` ends the sequence, and anything pushed after it
//! is ignored. A stream that ends without a done marker is reported by
//! [`ChunkDecoder::finish`] as an unexpected termination (surfaced to the
//! caller, not fatal).

use serde::Deserialize;

/// One wire record. Both fields are optional so a record carrying only a
/// done marker (or only text) parses; a record carrying neither is treated
/// as malformed.
#[derive(Debug, Deserialize)]
struct StreamRecord {
    response: Option<String>,
    done: Option<bool>,
}

/// How the stream ended, as reported by [`ChunkDecoder::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// A `done: true` record was seen; the sequence terminated normally.
    Clean,
    /// The input ended without a done marker (connection closed early).
    Unexpected,
}

/// Incremental decoder turning raw byte reads into ordered text fragments.
///
/// Push raw reads with [`push`](Self::push); each call returns the fragments
/// completed by that read, in wire order. Call [`finish`](Self::finish)
/// exactly once after the last read.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    /// Bytes of the incomplete trailing record, kept until its newline.
    buf: Vec<u8>,
    done: bool,
    skipped: usize,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one raw read into the decoder and returns the text fragments
    /// completed by it.
    ///
    /// Empty fragments (records whose `response` is empty, or pure done
    /// markers) produce no output. Input after the done marker is ignored.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut fragments = Vec::new();
        if self.done {
            return fragments;
        }

        self.buf.extend_from_slice(bytes);

        // Consume complete lines; the tail (if any) stays buffered.
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            if line.is_empty() {
                continue;
            }
            match self.decode_line(line) {
                Some(fragment) if !fragment.is_empty() => fragments.push(fragment),
                _ => {}
            }
            if self.done {
                self.buf.clear();
                break;
            }
        }

        fragments
    }

    /// Parses one complete line, returning its text fragment if any.
    ///
    /// Non-JSON lines and records with neither a text field nor a done flag
    /// are skipped and counted, never fatal.
    fn decode_line(&mut self, line: &[u8]) -> Option<String> {
        let record: StreamRecord = match serde_json::from_slice(line) {
            Ok(r) => r,
            Err(e) => {
                self.skipped += 1;
                tracing::warn!(error = %e, "skipping malformed stream record");
                return None;
            }
        };

        if record.response.is_none() && record.done.is_none() {
            self.skipped += 1;
            tracing::warn!("skipping stream record with no recognized fields");
            return None;
        }

        if record.done == Some(true) {
            self.done = true;
        }
        record.response
    }

    /// True once the done marker has been seen; no further reads are needed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of malformed records skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Marks end of input and reports how the stream terminated.
    ///
    /// An incomplete trailing record (bytes with no final newline) is
    /// discarded here; it can never become a fragment.
    pub fn finish(&mut self) -> StreamEnd {
        if !self.buf.is_empty() {
            tracing::warn!(bytes = self.buf.len(), "discarding incomplete trailing record");
            self.buf.clear();
        }
        if self.done {
            StreamEnd::Clean
        } else {
            StreamEnd::Unexpected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut ChunkDecoder, input: &[u8]) -> Vec<String> {
        decoder.push(input)
    }

    #[test]
    fn single_read_multiple_records() {
        let mut d = ChunkDecoder::new();
        let frags = decode_all(
            &mut d,
            b"{\"response\":\"Hello \",\"done\":false}\n{\"response\":\"world\",\"done\":false}\n",
        );
        assert_eq!(frags, vec!["Hello ", "world"]);
        assert!(!d.is_done());
    }

    #[test]
    fn record_split_across_reads() {
        let mut d = ChunkDecoder::new();
        assert!(d.push(b"{\"response\":\"ab").is_empty());
        let frags = d.push(b"c\",\"done\":false}\n");
        assert_eq!(frags, vec!["abc"]);
    }

    #[test]
    fn byte_at_a_time_matches_unsplit() {
        let input: &[u8] = "{\"response\":\"caf\u{00e9}\",\"done\":false}\n{\"response\":\"!\",\"done\":true}\n"
            .as_bytes();

        let mut whole = ChunkDecoder::new();
        let expected = whole.push(input);

        // Same input one byte at a time — splits land inside the multi-byte
        // UTF-8 sequence as well as inside the JSON framing.
        let mut split = ChunkDecoder::new();
        let mut got = Vec::new();
        for b in input {
            got.extend(split.push(std::slice::from_ref(b)));
        }

        assert_eq!(got, expected);
        assert_eq!(got, vec!["caf\u{00e9}", "!"]);
        assert!(split.is_done());
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let mut d = ChunkDecoder::new();
        let frags = d.push(
            b"not json at all\n{\"unrelated\":1}\n{\"response\":\"ok\",\"done\":false}\n",
        );
        assert_eq!(frags, vec!["ok"]);
        assert_eq!(d.skipped(), 2);
        assert_eq!(d.finish(), StreamEnd::Unexpected);
    }

    #[test]
    fn done_marker_terminates_and_later_input_is_ignored() {
        let mut d = ChunkDecoder::new();
        let frags = d.push(b"{\"response\":\"end\",\"done\":true}\n{\"response\":\"ghost\",\"done\":false}\n");
        assert_eq!(frags, vec!["end"]);
        assert!(d.is_done());
        assert!(d.push(b"{\"response\":\"more\",\"done\":false}\n").is_empty());
        assert_eq!(d.finish(), StreamEnd::Clean);
    }

    #[test]
    fn missing_done_at_end_is_unexpected() {
        let mut d = ChunkDecoder::new();
        d.push(b"{\"response\":\"partial\",\"done\":false}\n{\"response\":\"trunc");
        assert_eq!(d.finish(), StreamEnd::Unexpected);
    }

    #[test]
    fn empty_fragments_and_blank_lines_produce_nothing() {
        let mut d = ChunkDecoder::new();
        let frags = d.push(b"\n{\"response\":\"\",\"done\":false}\n{\"done\":true}\n");
        assert!(frags.is_empty());
        assert!(d.is_done());
        assert_eq!(d.skipped(), 0);
    }
}
