use crate::buffer::TextBuffer;
use crate::search::{eq_ignore_case, find_from, MatchStatus, SearchState};

/// Outcome of a whole-document replacement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced(usize),
    NoMatches,
    Empty,
}

impl ReplaceOutcome {
    pub fn label(&self) -> String {
        match self {
            ReplaceOutcome::Replaced(n) => format!("Replaced {}", n),
            ReplaceOutcome::NoMatches => MatchStatus::NoMatches.label().to_string(),
            ReplaceOutcome::Empty => String::new(),
        }
    }
}

/// Replace the occurrence the search currently sits on, then advance to the
/// next one.
///
/// The match position is recomputed from the tracked end offset, and the
/// buffer is re-read and re-validated against the query before anything is
/// touched; if the text moved underneath the search, the call is a silent
/// no-op (None) instead of clobbering unrelated bytes.
pub fn replace_current<B: TextBuffer>(
    buf: &mut B,
    search: &mut SearchState,
    replacement: &str,
) -> Option<MatchStatus> {
    if !search.is_active() || search.query().is_empty() {
        return None;
    }
    let query_len = search.query().len();
    let end = search.last_match_end();
    let start = end.checked_sub(query_len)?;

    let current = buf.slice(start..end)?;
    if !eq_ignore_case(&current, search.query()) {
        return None;
    }
    if !buf.replace_range(start..end, replacement) {
        return None;
    }
    search.set_last_match_end(start + replacement.len());
    Some(search.find_next(buf))
}

/// Replace every occurrence in the document.
///
/// Hits are collected in a single up-front scan that advances one byte past
/// each hit's start, so overlapping occurrences are counted; replacements are
/// then applied highest offset first so the earlier offsets stay valid. A
/// range invalidated by an overlapping replacement above it is skipped
/// silently. The search position is left as it was.
pub fn replace_all<B: TextBuffer>(
    buf: &mut B,
    search: &SearchState,
    replacement: &str,
) -> ReplaceOutcome {
    if !search.is_active() || search.query().is_empty() {
        return ReplaceOutcome::Empty;
    }
    let text = buf.text();
    let mut matches = Vec::new();
    let mut pos = 0usize;
    while let Some(m) = find_from(&text, search.query(), pos) {
        pos = m.start + 1;
        matches.push(m);
    }
    if matches.is_empty() {
        return ReplaceOutcome::NoMatches;
    }

    for m in matches.iter().rev() {
        buf.replace_range(m.start..m.end(), replacement);
    }
    ReplaceOutcome::Replaced(matches.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::testing::StringBuffer;

    fn searching(text: &str, query: &str) -> (StringBuffer, SearchState) {
        let mut buf = StringBuffer::new(text);
        let mut state = SearchState::default();
        state.open(0);
        state.set_query(&mut buf, query);
        (buf, state)
    }

    #[test]
    fn test_replace_current_advances() {
        let (mut buf, mut state) = searching("cat cat cat", "cat");
        let status = replace_current(&mut buf, &mut state, "dog");
        assert_eq!(status, Some(MatchStatus::Found));
        assert_eq!(buf.text, "dog cat cat");
        // The next occurrence is selected already
        assert_eq!(buf.selection, Some((4, 7)));
    }

    #[test]
    fn test_replace_current_with_longer_text() {
        let (mut buf, mut state) = searching("a b", "a");
        replace_current(&mut buf, &mut state, "longer");
        assert_eq!(buf.text, "longer b");
        assert_eq!(state.last_match_end(), 6);
    }

    #[test]
    fn test_replace_current_is_case_insensitive() {
        let (mut buf, mut state) = searching("CAT nap", "cat");
        assert!(replace_current(&mut buf, &mut state, "dog").is_some());
        assert_eq!(buf.text, "dog nap");
    }

    #[test]
    fn test_stale_state_is_a_silent_noop() {
        let (mut buf, mut state) = searching("cat cat", "cat");
        // The buffer changes underneath the search
        buf.text = "cut cat".to_string();
        assert_eq!(replace_current(&mut buf, &mut state, "dog"), None);
        assert_eq!(buf.text, "cut cat");
    }

    #[test]
    fn test_replace_current_without_query() {
        let mut buf = StringBuffer::new("anything");
        let mut state = SearchState::default();
        state.open(0);
        assert_eq!(replace_current(&mut buf, &mut state, "x"), None);
        assert_eq!(buf.text, "anything");
    }

    #[test]
    fn replace_all_counts_overlapping_hits() {
        // The collection scan advances one byte per hit, so "aaa" holds
        // three logical occurrences of "a"
        let (mut buf, state) = searching("aaa", "a");
        assert_eq!(
            replace_all(&mut buf, &state, "b"),
            ReplaceOutcome::Replaced(3)
        );
        assert_eq!(buf.text, "bbb");
    }

    #[test]
    fn test_replace_all_keeps_earlier_offsets_valid() {
        // Replacement longer than the query must not shift pending hits
        let (mut buf, state) = searching("x.x.x", "x");
        assert_eq!(
            replace_all(&mut buf, &state, "yy"),
            ReplaceOutcome::Replaced(3)
        );
        assert_eq!(buf.text, "yy.yy.yy");
    }

    #[test]
    fn test_replace_all_case_insensitive() {
        let (mut buf, state) = searching("Cat cAt CAT", "cat");
        assert_eq!(
            replace_all(&mut buf, &state, "dog"),
            ReplaceOutcome::Replaced(3)
        );
        assert_eq!(buf.text, "dog dog dog");
    }

    #[test]
    fn test_replace_all_no_matches() {
        let (mut buf, state) = searching("plain text", "zzz");
        assert_eq!(replace_all(&mut buf, &state, "x"), ReplaceOutcome::NoMatches);
        assert_eq!(buf.text, "plain text");
    }

    #[test]
    fn test_replace_all_empty_query() {
        let mut buf = StringBuffer::new("abc");
        let mut state = SearchState::default();
        state.open(0);
        assert_eq!(replace_all(&mut buf, &state, "x"), ReplaceOutcome::Empty);
        assert_eq!(buf.text, "abc");
    }

    #[test]
    fn test_replace_all_leaves_search_position() {
        let (mut buf, mut state) = searching("cat cat", "cat");
        let before = state.last_match_end();
        replace_all(&mut buf, &mut state, "dog");
        assert_eq!(state.last_match_end(), before);
    }
}
