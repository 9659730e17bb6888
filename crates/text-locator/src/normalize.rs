//! Char-indexed text helpers and normalization with source mapping.
//!
//! Every offset in this crate counts Unicode scalar values, not bytes. The
//! normalizers keep, for each output char, the index of the source char it
//! came from so a match found in normalized text can be mapped back.

use std::ops::Range;

/// How aggressively text is folded before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Collapse whitespace runs to one space and trim.
    Whitespace,
    /// Whitespace collapsing plus lowercase.
    CaseFolded,
    /// Case folding plus punctuation stripping.
    Aggressive,
}

/// Normalized text with a per-char map back into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub chars: Vec<char>,
    origin: Vec<usize>,
}

impl Normalized {
    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Source char range covered by a non-empty normalized range.
    pub fn source_range(&self, range: Range<usize>) -> Option<Range<usize>> {
        if range.start >= range.end || range.end > self.origin.len() {
            return None;
        }
        Some(self.origin[range.start]..self.origin[range.end - 1] + 1)
    }
}

pub fn normalize(input: &str, mode: NormalizeMode) -> Normalized {
    let mut chars = Vec::with_capacity(input.len());
    let mut origin = Vec::with_capacity(input.len());
    let mut pending_space: Option<usize> = None;

    for (index, ch) in input.chars().enumerate() {
        if ch.is_whitespace() {
            pending_space.get_or_insert(index);
            continue;
        }
        if mode == NormalizeMode::Aggressive && !ch.is_alphanumeric() {
            continue;
        }
        if let Some(space_at) = pending_space.take() {
            if !chars.is_empty() {
                chars.push(' ');
                origin.push(space_at);
            }
        }
        if mode == NormalizeMode::Whitespace {
            chars.push(ch);
            origin.push(index);
        } else {
            for lower in ch.to_lowercase() {
                chars.push(lower);
                origin.push(index);
            }
        }
    }

    Normalized { chars, origin }
}

/// Collapse whitespace runs and trim.
pub fn normalize_whitespace(input: &str) -> String {
    normalize(input, NormalizeMode::Whitespace).as_string()
}

/// A whitespace-delimited token with its source char range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Lowercase alphanumeric form used for comparisons.
    pub key: String,
    pub range: Range<usize>,
}

/// Whitespace tokens of `input`; tokens with no alphanumeric content are dropped.
pub fn words(input: &str) -> Vec<Word> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut count = 0usize;
    for (index, ch) in input.chars().enumerate() {
        count = index + 1;
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                push_word(input, s..index, &mut out);
                start = None;
            }
            (false, None) => start = Some(index),
            _ => {}
        }
    }
    if let Some(s) = start {
        push_word(input, s..count, &mut out);
    }
    out
}

fn push_word(input: &str, range: Range<usize>, out: &mut Vec<Word>) {
    let key: String = char_slice(input, range.clone())
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    if !key.is_empty() {
        out.push(Word { key, range });
    }
}

pub fn char_len(input: &str) -> usize {
    input.chars().count()
}

/// Substring by char range; out-of-range bounds are clamped.
pub fn char_slice(input: &str, range: Range<usize>) -> &str {
    let start = byte_index(input, range.start);
    let end = byte_index(input, range.end.max(range.start));
    &input[start..end]
}

fn byte_index(input: &str, char_index: usize) -> usize {
    input
        .char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(input.len())
}

/// Char index of the first occurrence of `needle`.
pub fn find_char_index(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

/// Char indices of every (possibly overlapping) occurrence of `needle`.
pub fn find_all_char_indices(haystack: &str, needle: &str) -> Vec<usize> {
    let mut out = Vec::new();
    if needle.is_empty() {
        return out;
    }
    let mut byte_from = 0usize;
    let mut chars_before = 0usize;
    while let Some(found) = haystack[byte_from..].find(needle) {
        let byte = byte_from + found;
        chars_before += haystack[byte_from..byte].chars().count();
        out.push(chars_before);
        // step one char past the match start
        let step = haystack[byte..].chars().next().map_or(1, char::len_utf8);
        byte_from = byte + step;
        chars_before += 1;
    }
    out
}

/// Position of `needle` inside `haystack`, both as char slices.
pub fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Trim whitespace off both ends of a char range of `input`.
pub fn trim_range(input: &[char], range: Range<usize>) -> Range<usize> {
    let mut start = range.start.min(input.len());
    let mut end = range.end.min(input.len());
    while start < end && input[start].is_whitespace() {
        start += 1;
    }
    while end > start && input[end - 1].is_whitespace() {
        end -= 1;
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_mode_collapses_and_trims() {
        let norm = normalize("  Type \n\t Safety  ", NormalizeMode::Whitespace);
        assert_eq!(norm.as_string(), "Type Safety");
        assert_eq!(norm.source_range(0..11), Some(2..16));
    }

    #[test]
    fn aggressive_mode_strips_punctuation_and_case() {
        let norm = normalize("Hello, World! (v2)", NormalizeMode::Aggressive);
        assert_eq!(norm.as_string(), "hello world v2");
        // "world" maps back to the capitalised source word
        let at = find_chars(&norm.chars, &"world".chars().collect::<Vec<_>>()).unwrap();
        assert_eq!(norm.source_range(at..at + 5), Some(7..12));
    }

    #[test]
    fn words_carry_source_ranges() {
        let tokens = words("Fast, safe -- code");
        let keys: Vec<&str> = tokens.iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys, vec!["fast", "safe", "code"]);
        assert_eq!(tokens[1].range, 6..10);
        assert_eq!(tokens[2].range, 14..18);
    }

    #[test]
    fn char_helpers_count_scalars_not_bytes() {
        let text = "naïve café";
        assert_eq!(char_len(text), 10);
        assert_eq!(char_slice(text, 6..10), "café");
        assert_eq!(find_char_index(text, "café"), Some(6));
        assert_eq!(char_slice(text, 8..40), "fé");
    }

    #[test]
    fn find_all_reports_overlapping_hits() {
        assert_eq!(find_all_char_indices("aaaa", "aa"), vec![0, 1, 2]);
        assert_eq!(find_all_char_indices("é-é-é", "é"), vec![0, 2, 4]);
        assert!(find_all_char_indices("abc", "").is_empty());
    }

    #[test]
    fn trim_range_skips_edge_whitespace() {
        let chars: Vec<char> = "  ab c  ".chars().collect();
        assert_eq!(trim_range(&chars, 0..8), 2..6);
        assert_eq!(trim_range(&chars, 0..2), 2..2);
    }
}
