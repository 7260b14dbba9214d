use std::io::Write;

use aquaedit::{CancelToken, EngineConfig, Patch, SearchQuery, TextBuffer, PAGE_SIZE};
use proptest::prelude::*;

fn open_buffer(bytes: &[u8], config: &EngineConfig) -> (TextBuffer, tempfile::NamedTempFile) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();

    let mut buffer = TextBuffer::with_config(config);
    buffer.open(file.path(), None, &CancelToken::new()).unwrap();
    (buffer, file)
}

/// Arbitrary LF-separated ASCII documents, including empty lines.
fn documents() -> impl Strategy<Value = String> {
    proptest::collection::vec("[ -~]{0,40}", 0..20)
        .prop_map(|lines| lines.join("\n"))
}

/// Documents with a mix of `\n` and `\r\n` terminators after every line.
fn mixed_terminator_documents() -> impl Strategy<Value = (Vec<String>, String)> {
    proptest::collection::vec(("[ -~]{0,30}", proptest::bool::ANY), 1..15).prop_map(|lines| {
        let mut raw = String::new();
        let mut expected = Vec::new();
        for (line, crlf) in lines {
            raw.push_str(&line);
            raw.push_str(if crlf { "\r\n" } else { "\n" });
            expected.push(line);
        }
        // The trailing terminator opens one final empty line.
        expected.push(String::new());
        (expected, raw)
    })
}

proptest! {
    #[test]
    fn lines_match_a_naive_split(doc in documents()) {
        let (mut buffer, _file) = open_buffer(doc.as_bytes(), &EngineConfig::default());
        let expected: Vec<&str> = doc.split('\n').collect();

        prop_assert_eq!(buffer.line_count(), expected.len());
        for (i, line) in expected.iter().enumerate() {
            prop_assert_eq!(&buffer.read_line(i), line);
        }
    }

    #[test]
    fn line_offsets_are_strictly_increasing_and_invert(doc in documents()) {
        let (buffer, _file) = open_buffer(doc.as_bytes(), &EngineConfig::default());

        for i in 0..buffer.line_count() {
            let offset = buffer.line_offset(i);
            if i > 0 {
                prop_assert!(offset > buffer.line_offset(i - 1));
            }
            prop_assert_eq!(buffer.line_of_offset(offset), i);
            prop_assert!(offset <= doc.len());
        }
    }

    #[test]
    fn untouched_save_round_trips(doc in documents()) {
        let (mut buffer, _file) = open_buffer(doc.as_bytes(), &EngineConfig::default());

        let out = tempfile::NamedTempFile::new().unwrap();
        buffer.save(out.path(), &CancelToken::new()).unwrap();
        prop_assert_eq!(std::fs::read(out.path()).unwrap(), doc.as_bytes());
    }

    #[test]
    fn insert_then_delete_is_identity(
        doc in "[ -~]{1,60}",
        at in 0usize..60,
        text in "[ -~]{1,20}",
    ) {
        let (mut buffer, _file) = open_buffer(doc.as_bytes(), &EngineConfig::default());
        let at = at.min(doc.len());
        let before = buffer.read_line(0);

        buffer.apply_edit(Patch::insert(at, text.clone()));
        buffer.apply_edit(Patch::delete(at, text.len()));

        prop_assert_eq!(buffer.read_line(0), before);
    }

    #[test]
    fn record_undo_redo_round_trips(
        doc in "[ -~]{1,60}",
        at in 0usize..60,
        text in "[ -~]{1,20}",
    ) {
        let (mut buffer, _file) = open_buffer(doc.as_bytes(), &EngineConfig::default());
        let at = at.min(doc.len());

        buffer.record_edit(Patch::insert(at, text));
        let edited = buffer.read_line(0);

        buffer.undo().unwrap();
        prop_assert_eq!(buffer.read_line(0), doc);

        buffer.redo().unwrap();
        prop_assert_eq!(buffer.read_line(0), edited);
        prop_assert!(buffer.can_undo());
        prop_assert!(!buffer.can_redo());
    }

    #[test]
    fn mixed_terminators_match_their_model((expected, raw) in mixed_terminator_documents()) {
        let (mut buffer, _file) = open_buffer(raw.as_bytes(), &EngineConfig::default());

        prop_assert_eq!(buffer.line_count(), expected.len());
        for (i, line) in expected.iter().enumerate() {
            prop_assert_eq!(&buffer.read_line(i), line);
        }
    }

    #[test]
    fn literal_search_matches_a_naive_scan(
        doc in documents(),
        needle in "[a-c]{1,3}",
    ) {
        let (mut buffer, _file) = open_buffer(doc.as_bytes(), &EngineConfig::default());

        let mut expected = Vec::new();
        for (i, line) in doc.split('\n').enumerate() {
            let mut from = 0;
            while let Some(found) = line[from..].find(&needle) {
                expected.push((i, from + found));
                from += found + needle.len();
            }
        }

        let hits: Vec<(usize, usize)> = buffer
            .search(SearchQuery::literal(needle.clone(), true), &CancelToken::new())
            .map(|hit| hit.map(|h| (h.line_index, h.char_index)))
            .collect::<aquaedit::Result<_>>()
            .unwrap();

        prop_assert_eq!(hits, expected);
    }

    #[test]
    fn window_cache_never_exceeds_capacity(
        reads in proptest::collection::vec((0usize..8 * PAGE_SIZE, 1usize..64), 1..40),
        capacity in 1usize..4,
    ) {
        let config = EngineConfig::default()
            .with_cache_capacity(capacity)
            .with_window_len(PAGE_SIZE);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![b'z'; 8 * PAGE_SIZE]).unwrap();
        file.flush().unwrap();

        let mut files = aquaedit::FileManager::with_config(&config);
        files.open(file.path()).unwrap();
        for (offset, count) in reads {
            let count = count.min(8 * PAGE_SIZE - offset);
            files.read_bytes(offset, count).unwrap();
            prop_assert!(files.cache().len() <= capacity);
        }
    }
}
