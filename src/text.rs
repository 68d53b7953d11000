//! Logical text streams over fragmented text runs.
//!
//! Authoring tools split a paragraph into runs wherever formatting, spell
//! checking or edit history changes, so a token like `{{COMPANY_NAME}}` may
//! arrive as `"{{COMP"` + `"ANY_NAME}}"`. [`LogicalText`] concatenates the
//! runs and remembers which bytes came from which run. Matching works on the
//! concatenated string only; [`replace_in_runs`] maps each match back onto the
//! runs it covered.

use std::ops::Range;

/// Concatenated text of a sequence of runs with a byte map back to each run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalText {
    text: String,
    spans: Vec<Range<usize>>,
}

impl LogicalText {
    /// Build the stream for a sequence of run texts.
    pub fn new<S: AsRef<str>>(runs: &[S]) -> Self {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(runs.len());
        for run in runs {
            let start = text.len();
            text.push_str(run.as_ref());
            spans.push(start..text.len());
        }
        Self { text, spans }
    }

    /// The concatenated text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Runs overlapped by `range`, in order, each with the overlapped
    /// byte range expressed in run-local offsets. Empty runs never overlap.
    pub fn overlapping(&self, range: Range<usize>) -> impl Iterator<Item = (usize, Range<usize>)> + '_ {
        self.spans.iter().enumerate().filter_map(move |(run, span)| {
            let start = span.start.max(range.start);
            let end = span.end.min(range.end);
            (start < end).then(|| (run, start - span.start..end - span.start))
        })
    }
}

/// Replace every leftmost, non-overlapping occurrence of `key` in the
/// logical text of `runs` with `value`, returning the number of matches.
///
/// The replacement lands in the first run a match overlaps, so it takes that
/// run's formatting; the matched bytes are removed from every other run.
/// Text outside a match never moves between runs.
pub fn replace_in_runs(runs: &mut [String], key: &str, value: &str) -> usize {
    if key.is_empty() {
        return 0;
    }

    let stream = LogicalText::new(&*runs);
    let starts: Vec<usize> = stream.as_str().match_indices(key).map(|(i, _)| i).collect();

    // Back to front: edits only touch bytes at or after a match's start, so
    // earlier matches keep valid run-local offsets.
    for &start in starts.iter().rev() {
        let mut first = true;
        for (run, local) in stream.overlapping(start..start + key.len()) {
            let insert = if first { value } else { "" };
            runs[run].replace_range(local, insert);
            first = false;
        }
    }

    starts.len()
}
