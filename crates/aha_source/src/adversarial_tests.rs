//! Adversarial tests for the source buffer — hostile feeding patterns that
//! must neither panic nor corrupt the decoded log.

#[cfg(test)]
mod tests {
    use crate::{ReplSource, Source, SourceState};

    /// Mixed-width text with several terminator styles.
    const SAMPLE: &str = "let x = 1\r\nfunc 변수 €😀\rend\u{2028}tail";

    /// What SAMPLE should decode to after canonicalization.
    fn canonical() -> Vec<char> {
        "let x = 1\nfunc 변수 €😀\nend\ntail".chars().collect()
    }

    fn drain(src: &mut ReplSource) -> Vec<char> {
        let mut out = Vec::new();
        while let Some((ch, _)) = src.read_char().expect("valid input must decode") {
            out.push(ch);
        }
        out
    }

    #[test]
    fn test_byte_at_a_time_feeding() {
        let mut src = ReplSource::new("<test>");
        let mut chars = Vec::new();
        for &b in SAMPLE.as_bytes() {
            src.feed_bytes(&[b]);
            chars.extend(drain(&mut src));
        }
        src.feed_eof();
        chars.extend(drain(&mut src));
        assert_eq!(chars, canonical());
    }

    #[test]
    fn test_every_chunk_size_decodes_identically() {
        for chunk in [1, 2, 3, 5, 7, 11, 64] {
            let mut src = ReplSource::new("<test>");
            let mut chars = Vec::new();
            for piece in SAMPLE.as_bytes().chunks(chunk) {
                src.feed_bytes(piece);
                chars.extend(drain(&mut src));
            }
            src.feed_eof();
            chars.extend(drain(&mut src));
            assert_eq!(chars, canonical(), "chunk size {chunk}");
        }
    }

    #[test]
    fn test_empty_feeds_are_harmless() {
        let mut src = ReplSource::new("<test>");
        src.feed_bytes(&[]);
        src.feed_bytes(b"a");
        src.feed_bytes(&[]);
        assert_eq!(drain(&mut src), vec!['a']);
    }

    #[test]
    fn test_huge_single_line() {
        let mut src = ReplSource::new("<test>");
        let line = "x".repeat(100_000);
        src.feed_bytes(line.as_bytes());
        src.feed_bytes(b"\n");
        let chars = drain(&mut src);
        assert_eq!(chars.len(), 100_001);
        assert_eq!(src.line_size(0), 100_001);
        assert_eq!(src.endpoint().line, 1);
    }

    #[test]
    fn test_many_blank_lines() {
        let mut src = ReplSource::new("<test>");
        src.feed_bytes("\n".repeat(10_000).as_bytes());
        let chars = drain(&mut src);
        assert_eq!(chars.len(), 10_000);
        assert_eq!(src.endpoint().line, 10_000);
        assert_eq!(src.line_size(5_000), 1);
    }

    #[test]
    fn test_error_drops_only_queued_bytes() {
        let mut src = ReplSource::new("<test>");
        src.feed_bytes(b"ok\n\xffgarbage");
        let mut chars = drain3(&mut src);
        assert!(src.read_char().is_err());
        assert_eq!(src.state(), SourceState::Error);

        // Recovery throws away everything after the bad byte as well; the
        // log of already-decoded text survives.
        src.clear_buffer();
        src.feed_bytes(b"x");
        chars.extend(drain(&mut src));
        assert_eq!(chars, vec!['o', 'k', '\n', 'x']);
        assert_eq!(src.get_char(crate::SourcePos::new(0, 0)), 'o');
    }

    fn drain3(src: &mut ReplSource) -> Vec<char> {
        (0..3)
            .map(|_| src.read_char().unwrap().expect("three chars queued").0)
            .collect()
    }

    #[test]
    fn test_interleaved_feed_and_read() {
        let mut src = ReplSource::new("<test>");
        src.feed_bytes(b"ab");
        assert_eq!(drain(&mut src), vec!['a', 'b']);
        src.feed_bytes("é".as_bytes());
        assert_eq!(drain(&mut src), vec!['é']);
        src.feed_bytes(b"\r");
        assert_eq!(drain(&mut src), vec!['\n']);
        // The elided LF of a CRLF pair arriving much later.
        src.feed_bytes(b"\nz");
        assert_eq!(drain(&mut src), vec!['z']);
    }

    #[test]
    fn test_stray_continuation_bytes() {
        for lead in [0x80u8, 0x9f, 0xbf] {
            let mut src = ReplSource::new("<test>");
            src.feed_bytes(&[lead]);
            assert!(src.read_char().is_err(), "byte {lead:#x}");
        }
    }

    #[test]
    fn test_all_single_bytes_never_panic() {
        for b in 0u8..=255 {
            let mut src = ReplSource::new("<test>");
            src.feed_bytes(&[b]);
            src.feed_eof();
            // Either a character, starvation, or a clean error.
            let _ = src.read_char();
        }
    }
}
