use crate::buffer::TextBuffer;

/// Outcome of a search or replace step, surfaced as status text, never as an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Found,
    Wrapped,
    NoMatches,
    Empty,
}

impl MatchStatus {
    /// The text shown in the search bar; `Empty` clears it.
    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::Found => "Found",
            MatchStatus::Wrapped => "Wrapped",
            MatchStatus::NoMatches => "No matches",
            MatchStatus::Empty => "",
        }
    }
}

/// A located occurrence, in byte offsets. Transient; the durable position
/// lives in `SearchState::last_match_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub len: usize,
}

impl Match {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Incremental search over a buffer, tracked relative to the cursor position
/// captured when the bar opened (the anchor). Wraparound is judged against
/// that running position: a wrapped hit is only accepted below it.
#[derive(Debug, Default)]
pub struct SearchState {
    query: String,
    anchor: usize,
    last_match_end: usize,
    active: bool,
}

impl SearchState {
    /// Open the bar at the given cursor offset. No match is reported until a
    /// query arrives.
    pub fn open(&mut self, cursor: usize) {
        self.query.clear();
        self.anchor = cursor;
        self.last_match_end = cursor;
        self.active = true;
    }

    /// Close the bar. The caller restores edit focus on the buffer.
    pub fn close(&mut self) {
        self.active = false;
        self.query.clear();
        self.last_match_end = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn last_match_end(&self) -> usize {
        self.last_match_end
    }

    pub(crate) fn set_last_match_end(&mut self, end: usize) {
        self.last_match_end = end;
    }

    /// Incremental query update. A changed query restarts from the anchor and
    /// searches immediately; an empty query clears the highlight; an
    /// unchanged query reports nothing (None).
    pub fn set_query<B: TextBuffer>(&mut self, buf: &mut B, new_query: &str) -> Option<MatchStatus> {
        if !self.active {
            return None;
        }
        if new_query.is_empty() {
            buf.clear_selection();
            return Some(MatchStatus::Empty);
        }
        if new_query == self.query {
            return None;
        }
        self.query = new_query.to_string();
        self.last_match_end = self.anchor;
        Some(self.find_next(buf))
    }

    /// Case-insensitive forward scan from the end of the previous match,
    /// wrapping to the top of the document when nothing lies ahead.
    pub fn find_next<B: TextBuffer>(&mut self, buf: &mut B) -> MatchStatus {
        if !self.active || self.query.is_empty() {
            return MatchStatus::Empty;
        }
        let text = buf.text();
        let origin = self.last_match_end;

        if let Some(m) = find_from(&text, &self.query, origin) {
            self.last_match_end = m.end();
            buf.select(m.start, m.end());
            return MatchStatus::Found;
        }

        // Nothing ahead; only accept a hit that lies before where we were.
        if let Some(m) = find_from(&text, &self.query, 0) {
            if m.start < origin {
                self.last_match_end = m.end();
                buf.select(m.start, m.end());
                return MatchStatus::Wrapped;
            }
        }
        MatchStatus::NoMatches
    }

    /// The last occurrence strictly before the current one, wrapping to the
    /// last occurrence in the rest of the document.
    pub fn find_previous<B: TextBuffer>(&mut self, buf: &mut B) -> MatchStatus {
        if !self.active || self.query.is_empty() {
            return MatchStatus::Empty;
        }
        let text = buf.text();
        let limit = self.last_match_end as i64 - self.query.len() as i64 - 1;

        if let Some(m) = last_match_below(&text, &self.query, limit) {
            self.last_match_end = m.end();
            buf.select(m.start, m.end());
            return MatchStatus::Found;
        }

        let wrap_from = if limit + 1 > 0 { (limit + 1) as usize } else { 0 };
        let mut wrap = None;
        let mut pos = wrap_from;
        while let Some(m) = find_from(&text, &self.query, pos) {
            wrap = Some(m);
            pos = m.start + 1;
        }
        if let Some(m) = wrap {
            self.last_match_end = m.end();
            buf.select(m.start, m.end());
            return MatchStatus::Wrapped;
        }
        MatchStatus::NoMatches
    }
}

/// First case-insensitive occurrence of `query` at or after `from`.
/// Comparison lower-cases both sides character by character; no locale
/// collation. Returned offsets are byte offsets into `text`.
pub(crate) fn find_from(text: &str, query: &str, from: usize) -> Option<Match> {
    if query.is_empty() || from > text.len() {
        return None;
    }
    let mut idx = from;
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    loop {
        if let Some(end) = match_at(text, idx, query) {
            return Some(Match {
                start: idx,
                len: end - idx,
            });
        }
        match text[idx..].chars().next() {
            Some(c) => idx += c.len_utf8(),
            None => return None,
        }
    }
}

/// Last occurrence whose start is strictly below `limit`, found by scanning
/// forward and keeping the latest hit.
fn last_match_below(text: &str, query: &str, limit: i64) -> Option<Match> {
    let mut best = None;
    let mut pos = 0usize;
    while let Some(m) = find_from(text, query, pos) {
        if (m.start as i64) >= limit {
            break;
        }
        best = Some(m);
        pos = m.start + 1;
    }
    best
}

fn match_at(text: &str, start: usize, query: &str) -> Option<usize> {
    let mut hay = text[start..].chars();
    let mut end = start;
    for qc in query.chars() {
        let tc = hay.next()?;
        if !tc.to_lowercase().eq(qc.to_lowercase()) {
            return None;
        }
        end += tc.len_utf8();
    }
    Some(end)
}

pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    let mut ai = a.chars().flat_map(char::to_lowercase);
    let mut bi = b.chars().flat_map(char::to_lowercase);
    loop {
        match (ai.next(), bi.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => {}
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::testing::StringBuffer;

    fn opened(text: &str, cursor: usize) -> (StringBuffer, SearchState) {
        let buf = StringBuffer::new(text);
        let mut state = SearchState::default();
        state.open(cursor);
        (buf, state)
    }

    #[test]
    fn test_open_initializes_from_cursor() {
        let (_, state) = opened("hello", 3);
        assert!(state.is_active());
        assert_eq!(state.query(), "");
        assert_eq!(state.last_match_end(), 3);
    }

    #[test]
    fn test_find_ahead_of_cursor() {
        let (mut buf, mut state) = opened("one two one", 0);
        assert_eq!(state.set_query(&mut buf, "two"), Some(MatchStatus::Found));
        assert_eq!(buf.selection, Some((4, 7)));
        assert_eq!(state.last_match_end(), 7);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let (mut buf, mut state) = opened("Hello WORLD", 0);
        assert_eq!(state.set_query(&mut buf, "world"), Some(MatchStatus::Found));
        assert_eq!(buf.selection, Some((6, 11)));
    }

    #[test]
    fn test_empty_query_clears_highlight() {
        let (mut buf, mut state) = opened("abc abc", 0);
        state.set_query(&mut buf, "abc");
        assert!(buf.selection.is_some());

        assert_eq!(state.set_query(&mut buf, ""), Some(MatchStatus::Empty));
        assert_eq!(buf.selection, None);
    }

    #[test]
    fn test_unchanged_query_reports_nothing() {
        let (mut buf, mut state) = opened("abc abc", 0);
        state.set_query(&mut buf, "abc");
        let end = state.last_match_end();
        assert_eq!(state.set_query(&mut buf, "abc"), None);
        assert_eq!(state.last_match_end(), end);
    }

    #[test]
    fn test_changed_query_restarts_from_anchor() {
        let (mut buf, mut state) = opened("ab ab ab", 3);
        state.set_query(&mut buf, "ab");
        assert_eq!(buf.selection, Some((3, 5)));
        state.find_next(&mut buf);
        assert_eq!(buf.selection, Some((6, 8)));

        // New query searches from where the bar was opened, not from the
        // previous match
        assert_eq!(state.set_query(&mut buf, "a"), Some(MatchStatus::Found));
        assert_eq!(buf.selection, Some((3, 4)));
    }

    #[test]
    fn test_find_next_steps_past_match() {
        let (mut buf, mut state) = opened("aaaa", 0);
        state.set_query(&mut buf, "aa");
        assert_eq!(buf.selection, Some((0, 2)));
        assert_eq!(state.find_next(&mut buf), MatchStatus::Found);
        assert_eq!(buf.selection, Some((2, 4)));
    }

    #[test]
    fn test_wraparound_before_anchor() {
        let (mut buf, mut state) = opened("needle in a haystack", 8);
        assert_eq!(
            state.set_query(&mut buf, "needle"),
            Some(MatchStatus::Wrapped)
        );
        assert_eq!(buf.selection, Some((0, 6)));
    }

    #[test]
    fn lone_occurrence_keeps_wrapping() {
        // Cyclic wraparound: the only hit sits behind the cursor and is
        // reported Wrapped again on every further step.
        let (mut buf, mut state) = opened("needle in a haystack", 8);
        assert_eq!(
            state.set_query(&mut buf, "needle"),
            Some(MatchStatus::Wrapped)
        );
        assert_eq!(state.find_next(&mut buf), MatchStatus::Wrapped);
        assert_eq!(buf.selection, Some((0, 6)));
    }

    #[test]
    fn test_no_matches_leaves_state_unchanged() {
        let (mut buf, mut state) = opened("plain text", 4);
        assert_eq!(
            state.set_query(&mut buf, "missing"),
            Some(MatchStatus::NoMatches)
        );
        assert_eq!(state.last_match_end(), 4);
        assert_eq!(buf.selection, None);
    }

    #[test]
    fn test_find_previous_steps_back() {
        let (mut buf, mut state) = opened("ab ab ab", 0);
        state.set_query(&mut buf, "ab");
        state.find_next(&mut buf);
        state.find_next(&mut buf);
        assert_eq!(buf.selection, Some((6, 8)));

        assert_eq!(state.find_previous(&mut buf), MatchStatus::Found);
        assert_eq!(buf.selection, Some((3, 5)));
        assert_eq!(state.find_previous(&mut buf), MatchStatus::Found);
        assert_eq!(buf.selection, Some((0, 2)));
    }

    #[test]
    fn test_find_previous_wraps_to_last() {
        let (mut buf, mut state) = opened("ab ab ab", 0);
        state.set_query(&mut buf, "ab");
        assert_eq!(buf.selection, Some((0, 2)));

        assert_eq!(state.find_previous(&mut buf), MatchStatus::Wrapped);
        assert_eq!(buf.selection, Some((6, 8)));
    }

    #[test]
    fn test_find_previous_without_matches() {
        let (mut buf, mut state) = opened("plain", 0);
        state.set_query(&mut buf, "zz");
        assert_eq!(state.find_previous(&mut buf), MatchStatus::NoMatches);
    }

    #[test]
    fn test_close_resets_state() {
        let (mut buf, mut state) = opened("abc", 0);
        state.set_query(&mut buf, "abc");
        state.close();
        assert!(!state.is_active());
        assert_eq!(state.query(), "");
        assert_eq!(state.last_match_end(), 0);
        assert_eq!(state.find_next(&mut buf), MatchStatus::Empty);
    }

    #[test]
    fn test_found_at_or_after_position() {
        // A query present at offset i is found by a search started at or
        // before i, reported Found
        let text = "xxxx target yyyy";
        for cursor in 0..=5 {
            let (mut buf, mut state) = opened(text, cursor);
            assert_eq!(
                state.set_query(&mut buf, "target"),
                Some(MatchStatus::Found)
            );
            assert_eq!(buf.selection, Some((5, 11)));
        }
    }

    #[test]
    fn test_find_from_multibyte() {
        let m = find_from("héllo héllo", "héllo", 1).unwrap();
        assert_eq!(m.start, 7);
        assert_eq!(m.len, 6);
    }

    #[test]
    fn test_eq_ignore_case() {
        assert!(eq_ignore_case("HeLLo", "hello"));
        assert!(!eq_ignore_case("hello", "hellp"));
        assert!(!eq_ignore_case("hello", "hell"));
    }
}
