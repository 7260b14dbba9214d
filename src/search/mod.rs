pub mod search_thread;

use std::collections::VecDeque;
use std::thread;

use regex::{Regex, RegexBuilder};

use crate::buffer::TextBuffer;
use crate::error::{EngineError, Result};
use crate::progress::CancelToken;

pub use search_thread::{SearchEvent, SearchThread};

/// Lines examined between cooperative yields.
const LINES_PER_YIELD: usize = 1000;

/// One match. Indexes and lengths are measured in characters of the decoded
/// line; the line text is captured into the hit so results stay valid after
/// later edits. For case-insensitive literal searches the indexes refer to
/// the case-folded line (identical to the original for ASCII).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub line_index: usize,
    pub char_index: usize,
    pub length: usize,
    pub line_text: String,
}

/// What to look for and how.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub term: String,
    pub case_sensitive: bool,
    pub use_regex: bool,
}

impl SearchQuery {
    pub fn literal(term: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            term: term.into(),
            case_sensitive,
            use_regex: false,
        }
    }

    pub fn regex(pattern: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            term: pattern.into(),
            case_sensitive,
            use_regex: true,
        }
    }
}

enum Matcher {
    Literal { term: String, case_sensitive: bool },
    Pattern(Regex),
}

impl Matcher {
    fn compile(query: &SearchQuery) -> Result<Self> {
        if query.use_regex {
            let regex = RegexBuilder::new(&query.term)
                .case_insensitive(!query.case_sensitive)
                .build()
                .map_err(|err| EngineError::BadPattern(err.to_string()))?;
            Ok(Matcher::Pattern(regex))
        } else {
            Ok(Matcher::Literal {
                term: query.term.clone(),
                case_sensitive: query.case_sensitive,
            })
        }
    }

    /// All non-overlapping matches on one line, left to right.
    fn hits(&self, line_index: usize, line: &str) -> Vec<SearchHit> {
        match self {
            Matcher::Literal {
                term,
                case_sensitive,
            } => literal_hits(line_index, line, term, *case_sensitive),
            Matcher::Pattern(regex) => regex
                .find_iter(line)
                .map(|found| SearchHit {
                    line_index,
                    char_index: line[..found.start()].chars().count(),
                    length: found.as_str().chars().count(),
                    line_text: line.to_string(),
                })
                .collect(),
        }
    }
}

fn literal_hits(
    line_index: usize,
    line: &str,
    term: &str,
    case_sensitive: bool,
) -> Vec<SearchHit> {
    if term.is_empty() {
        return Vec::new();
    }
    let (haystack, needle) = if case_sensitive {
        (line.to_string(), term.to_string())
    } else {
        (line.to_lowercase(), term.to_lowercase())
    };

    let mut hits = Vec::new();
    let mut from = 0;
    while let Some(found) = haystack[from..].find(&needle) {
        let at = from + found;
        hits.push(SearchHit {
            line_index,
            char_index: haystack[..at].chars().count(),
            length: needle.chars().count(),
            line_text: line.to_string(),
        });
        // Advance past the whole match so matches never overlap.
        from = at + needle.len();
    }
    hits
}

/// Lazy sequence of search hits over a buffer's lines, ascending.
///
/// The pattern compiles at the first poll, so an invalid regex surfaces as
/// `BadPattern` there. Cancellation is checked once per line; the stream
/// yields to the scheduler every 1,000 lines.
pub struct SearchStream<'a> {
    buffer: &'a mut TextBuffer,
    query: SearchQuery,
    cancel: CancelToken,
    matcher: Option<Matcher>,
    compiled: bool,
    next_line: usize,
    line_count: usize,
    pending: VecDeque<SearchHit>,
    done: bool,
}

impl Iterator for SearchStream<'_> {
    type Item = Result<SearchHit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.compiled {
            self.compiled = true;
            match Matcher::compile(&self.query) {
                Ok(matcher) => self.matcher = Some(matcher),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        if let Some(hit) = self.pending.pop_front() {
            return Some(Ok(hit));
        }

        let matcher = self.matcher.as_ref()?;
        while self.next_line < self.line_count {
            if self.cancel.is_cancelled() {
                self.done = true;
                return Some(Err(EngineError::Cancelled));
            }
            let i = self.next_line;
            self.next_line += 1;

            let line = self.buffer.read_line(i);
            self.pending.extend(matcher.hits(i, &line));

            if self.next_line % LINES_PER_YIELD == 0 {
                thread::yield_now();
            }
            if let Some(hit) = self.pending.pop_front() {
                return Some(Ok(hit));
            }
        }
        self.done = true;
        None
    }
}

/// Streams hits for `query` over every line of `buffer`, in ascending line
/// order.
pub fn search<'a>(
    buffer: &'a mut TextBuffer,
    query: SearchQuery,
    cancel: &CancelToken,
) -> SearchStream<'a> {
    let line_count = buffer.line_count();
    SearchStream {
        buffer,
        query,
        cancel: cancel.clone(),
        matcher: None,
        compiled: false,
        next_line: 0,
        line_count,
        pending: VecDeque::new(),
        done: false,
    }
}
