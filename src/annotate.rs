//! Resolves annotations onto disjoint character ranges of an essay.
//!
//! Annotations come from a language model and may repeat, overlap or quote
//! text that is not in the essay at all. Resolution is greedy and
//! left-to-right: it drops what it cannot place and never yields overlapping
//! spans.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::assessment::Annotation;

/// A resolved highlight over `[start, end)`, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightedSpan<'a> {
    /// First character of the span.
    pub start:      usize,
    /// One past the last character of the span.
    pub end:        usize,
    /// Annotation the span came from.
    pub annotation: &'a Annotation,
}

/// A run of display text: either plain or highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t, 'a> {
    /// Text with no annotation.
    Plain(&'t str),
    /// Text covered by an annotation.
    Highlight(&'t str, &'a Annotation),
}

impl Segment<'_, '_> {
    /// The text of the run.
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain(text) | Segment::Highlight(text, _) => text,
        }
    }
}

/// Two characters match when equal or when their lowercase forms agree.
fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Case-insensitive search for `needle` in `haystack` starting at `from`.
fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&start| {
        haystack[start..start + needle.len()]
            .iter()
            .zip(needle)
            .all(|(&h, &n)| chars_match(h, n))
    })
}

/// Maps `annotations` onto ascending, non-overlapping spans of `essay`.
///
/// Annotations are ordered by their first occurrence, then each is
/// re-located from the end of the previous span. Anything that cannot be
/// placed at or after that cursor is dropped.
pub fn map_annotations<'a>(essay: &str, annotations: &'a [Annotation]) -> Vec<HighlightedSpan<'a>> {
    let text: Vec<char> = essay.chars().collect();

    let mut located: Vec<(usize, &'a Annotation, Vec<char>)> = annotations
        .iter()
        .filter_map(|annotation| {
            let needle: Vec<char> = annotation.original_text.chars().collect();
            match find_from(&text, &needle, 0) {
                Some(first) => Some((first, annotation, needle)),
                None => {
                    tracing::debug!(
                        "dropping annotation not found in essay: {:?}",
                        annotation.original_text
                    );
                    None
                }
            }
        })
        .collect();

    // stable: ties keep input order
    located.sort_by_key(|(first, ..)| *first);

    let mut cursor = 0;
    let mut spans = Vec::with_capacity(located.len());
    for (_, annotation, needle) in located {
        match find_from(&text, &needle, cursor) {
            Some(start) if start >= cursor => {
                let end = start + needle.len();
                spans.push(HighlightedSpan {
                    start,
                    end,
                    annotation,
                });
                cursor = end;
            }
            _ => tracing::debug!(
                "dropping annotation with no occurrence after offset {cursor}: {:?}",
                annotation.original_text
            ),
        }
    }
    spans
}

/// Splits `essay` into plain and highlighted runs using `spans`, which must
/// come from [`map_annotations`] on the same text. Concatenating the runs
/// gives back `essay`.
pub fn segments<'t, 'a>(essay: &'t str, spans: &[HighlightedSpan<'a>]) -> Vec<Segment<'t, 'a>> {
    let offsets: Vec<usize> = essay
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(essay.len()))
        .collect();
    let byte_at = |char_idx: usize| offsets[char_idx.min(offsets.len() - 1)];

    let mut out = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;
    for span in spans {
        let (start, end) = (byte_at(span.start), byte_at(span.end));
        if start > cursor {
            out.push(Segment::Plain(&essay[cursor..start]));
        }
        out.push(Segment::Highlight(&essay[start..end], span.annotation));
        cursor = end;
    }
    if cursor < essay.len() {
        out.push(Segment::Plain(&essay[cursor..]));
    }
    out
}
