//! Rule-based sentence segmentation tuned for radiology report prose.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+|[^\w\s]").expect("valid regex"));

const TERMINATORS: &[char] = &['.', '!', '?'];
const CLOSERS: &[char] = &['"', '\'', ')', ']', '}'];
const ABBREVIATIONS: &[&str] = &[
    "approx", "cf", "dr", "e.g", "etc", "fig", "i.e", "mr", "mrs", "ms", "vs",
];

/// A sentence as a byte range of its document plus its token offset.
///
/// `start` is the number of tokens preceding the sentence and doubles as a
/// stable sentence id within one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub start: usize,
    pub span: Range<usize>,
}

impl Sentence {
    pub fn text<'a>(&self, document: &'a str) -> &'a str {
        &document[self.span.clone()]
    }
}

/// Splits text into sentences that together cover the whole document.
#[derive(Debug, Clone, Default)]
pub struct SentenceSplitter;

impl SentenceSplitter {
    pub fn new() -> Self {
        Self
    }

    /// Segment `text`. Ranges are contiguous: each sentence runs up to the
    /// first character of the next one, trailing whitespace included.
    pub fn split(&self, text: &str) -> Vec<Sentence> {
        if text.is_empty() {
            return Vec::new();
        }
        let bounds = self.boundaries(text);
        let token_starts: Vec<usize> = TOKEN.find_iter(text).map(|m| m.start()).collect();

        bounds
            .iter()
            .enumerate()
            .map(|(idx, &begin)| {
                let end = bounds.get(idx + 1).copied().unwrap_or(text.len());
                Sentence {
                    start: token_starts.partition_point(|&pos| pos < begin),
                    span: begin..end,
                }
            })
            .collect()
    }

    fn boundaries(&self, text: &str) -> Vec<usize> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut bounds = vec![0];
        let mut i = 0;
        while i < chars.len() {
            let (pos, ch) = chars[i];
            if ch == '\n' {
                let mut j = i;
                let mut newlines = 0;
                while j < chars.len() && chars[j].1.is_whitespace() {
                    if chars[j].1 == '\n' {
                        newlines += 1;
                    }
                    j += 1;
                }
                if newlines >= 2 && j < chars.len() {
                    push_bound(&mut bounds, chars[j].0);
                }
                i = j;
                continue;
            }
            if TERMINATORS.contains(&ch) {
                let mut j = i + 1;
                while j < chars.len()
                    && (TERMINATORS.contains(&chars[j].1) || CLOSERS.contains(&chars[j].1))
                {
                    j += 1;
                }
                let sentence_start = bounds.last().copied().unwrap_or(0);
                let followed_by_space = j < chars.len() && chars[j].1.is_whitespace();
                if followed_by_space && !(ch == '.' && is_non_terminal(text, sentence_start, pos)) {
                    let mut k = j;
                    while k < chars.len() && chars[k].1.is_whitespace() {
                        k += 1;
                    }
                    if k < chars.len() {
                        push_bound(&mut bounds, chars[k].0);
                    }
                    i = k;
                    continue;
                }
                i = j;
                continue;
            }
            i += 1;
        }
        bounds
    }
}

fn push_bound(bounds: &mut Vec<usize>, pos: usize) {
    if bounds.last().is_some_and(|&last| last >= pos) {
        return;
    }
    bounds.push(pos);
}

/// True when the period at `dot` ends an abbreviation or a leading list number.
fn is_non_terminal(text: &str, sentence_start: usize, dot: usize) -> bool {
    let head = text[sentence_start..dot].trim_start();
    let word_start = head
        .rfind(char::is_whitespace)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    let word = head[word_start..].trim_start_matches(['(', '[', '"', '\'']);
    if word.is_empty() {
        return false;
    }
    let lower = word.to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    // "1." opening a numbered finding
    word_start == 0 && word.chars().all(|c| c.is_ascii_digit())
}
