//! Approximate text matching.
//!
//! The combined score weighs normalized edit-distance similarity (40%), word
//! set overlap (40%) and character-bigram Jaccard overlap (20%). Near-identical
//! strings get a small bonus so they beat incidental partial overlaps.
//!
//! [`SimilarityMatcher::find_best_match`] runs a staged cascade; a stage only
//! runs when the previous ones failed to clear the threshold:
//! 1. exact, then case/whitespace-normalized substring
//! 2. sliding windows at several sizes relative to the target
//! 3. windows anchored right after (or before) the stored context
//! 4. partial word sequences, accepted at a relaxed threshold

use std::collections::HashSet;
use std::ops::Range;

use tracing::debug;

use crate::normalize::{
    char_len, find_all_char_indices, normalize, trim_range, words, NormalizeMode,
};

pub const DEFAULT_THRESHOLD: f64 = 0.7;

const EDIT_WEIGHT: f64 = 0.4;
const WORD_WEIGHT: f64 = 0.4;
const BIGRAM_WEIGHT: f64 = 0.2;
const BONUS_FLOOR: f64 = 0.6;
const BONUS: f64 = 0.2;
const BONUS_MAX_LEN_DIFF: usize = 2;

const NORMALIZED_SCORE: f64 = 0.95;
const WINDOW_FACTORS: [f64; 5] = [1.0, 0.8, 0.6, 1.2, 1.5];
const CONTEXT_FACTORS: [f64; 3] = [1.0, 0.8, 1.2];
const CONTEXT_PROBE_CHARS: usize = 32;
const RELAXED_FACTOR: f64 = 0.7;

/// Combined similarity in `[0, 1]`.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let left = normalize(a, NormalizeMode::CaseFolded).as_string();
    let right = normalize(b, NormalizeMode::CaseFolded).as_string();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let combined = EDIT_WEIGHT * strsim::normalized_levenshtein(&left, &right)
        + WORD_WEIGHT * word_overlap(&left, &right)
        + BIGRAM_WEIGHT * bigram_overlap(&left, &right);

    let len_diff = char_len(a).abs_diff(char_len(b));
    let score = if combined > BONUS_FLOOR && len_diff <= BONUS_MAX_LEN_DIFF {
        combined + BONUS
    } else {
        combined
    };
    score.clamp(0.0, 1.0)
}

fn word_overlap(a: &str, b: &str) -> f64 {
    let left: HashSet<String> = words(a).into_iter().map(|w| w.key).collect();
    let right: HashSet<String> = words(b).into_iter().map(|w| w.key).collect();
    jaccard(&left, &right)
}

fn bigram_overlap(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    jaccard(&bigrams(a), &bigrams(b))
}

fn bigrams(input: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = input.chars().collect();
    chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

fn jaccard<T: std::hash::Hash + Eq>(left: &HashSet<T>, right: &HashSet<T>) -> f64 {
    let union = left.union(right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(right).count() as f64 / union as f64
}

/// Text stored next to the selection, used to disambiguate and anchor searches.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchContext<'a> {
    pub before: &'a str,
    pub after: &'a str,
}

impl<'a> MatchContext<'a> {
    pub fn new(before: &'a str, after: &'a str) -> Self {
        Self { before, after }
    }

    fn is_empty(&self) -> bool {
        self.before.trim().is_empty() && self.after.trim().is_empty()
    }
}

/// Cascade stage that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    Exact,
    Normalized,
    SlidingWindow,
    ContextAnchored,
    PartialWords,
}

/// Best match found in a haystack, as a char range.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    pub range: Range<usize>,
    pub score: f64,
    pub stage: MatchStage,
}

struct Haystack<'a> {
    text: &'a str,
    chars: Vec<char>,
}

impl Haystack<'_> {
    fn window(&self, range: Range<usize>) -> String {
        self.chars[range].iter().collect()
    }
}

type Stage = fn(&SimilarityMatcher, &str, &Haystack<'_>, Option<&MatchContext<'_>>) -> Option<FuzzyMatch>;

/// Staged approximate matcher.
#[derive(Debug, Clone)]
pub struct SimilarityMatcher {
    threshold: f64,
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl SimilarityMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Threshold applied once every stage has failed the regular one.
    pub fn relaxed_threshold(&self) -> f64 {
        self.threshold * RELAXED_FACTOR
    }

    pub fn find_best_match(
        &self,
        target: &str,
        haystack: &str,
        context: Option<&MatchContext<'_>>,
    ) -> Option<FuzzyMatch> {
        let target = target.trim();
        if target.is_empty() || haystack.trim().is_empty() {
            return None;
        }
        let hay = Haystack {
            text: haystack,
            chars: haystack.chars().collect(),
        };

        let stages: [Stage; 4] = [
            Self::substring_stage,
            Self::window_stage,
            Self::context_stage,
            Self::partial_words_stage,
        ];

        let mut best: Option<FuzzyMatch> = None;
        for stage in stages {
            let Some(candidate) = stage(self, target, &hay, context) else {
                continue;
            };
            debug!(
                stage = ?candidate.stage,
                score = candidate.score,
                "similarity stage candidate"
            );
            if candidate.score >= self.threshold {
                return Some(candidate);
            }
            best = pick_better(best, candidate);
        }

        let relaxed = self.relaxed_threshold();
        best.filter(|candidate| candidate.score >= relaxed)
    }

    fn substring_stage(
        &self,
        target: &str,
        hay: &Haystack<'_>,
        context: Option<&MatchContext<'_>>,
    ) -> Option<FuzzyMatch> {
        let len = char_len(target);
        let exact: Vec<Range<usize>> = find_all_char_indices(hay.text, target)
            .into_iter()
            .map(|start| start..start + len)
            .collect();
        if let Some(range) = pick_by_context(hay, exact, context) {
            return Some(FuzzyMatch {
                range,
                score: 1.0,
                stage: MatchStage::Exact,
            });
        }

        let folded_hay = normalize(hay.text, NormalizeMode::CaseFolded);
        let folded_target = normalize(target, NormalizeMode::CaseFolded);
        let width = folded_target.chars.len();
        if width == 0 || width > folded_hay.chars.len() {
            return None;
        }
        let folded: Vec<Range<usize>> = folded_hay
            .chars
            .windows(width)
            .enumerate()
            .filter(|(_, window)| *window == folded_target.chars.as_slice())
            .filter_map(|(at, _)| folded_hay.source_range(at..at + width))
            .collect();
        pick_by_context(hay, folded, context).map(|range| FuzzyMatch {
            range,
            score: NORMALIZED_SCORE,
            stage: MatchStage::Normalized,
        })
    }

    fn window_stage(
        &self,
        target: &str,
        hay: &Haystack<'_>,
        _context: Option<&MatchContext<'_>>,
    ) -> Option<FuzzyMatch> {
        let target_len = char_len(target);
        let starts = word_starts(&hay.chars);
        let mut sizes: Vec<usize> = Vec::new();
        for factor in WINDOW_FACTORS {
            let size = scaled(target_len, factor).min(hay.chars.len());
            if !sizes.contains(&size) {
                sizes.push(size);
            }
        }

        let mut best: Option<FuzzyMatch> = None;
        for size in sizes {
            for &start in &starts {
                let end = (start + size).min(hay.chars.len());
                if let Some(candidate) = score_range(target, hay, start..end, MatchStage::SlidingWindow) {
                    best = pick_better(best, candidate);
                }
            }
        }
        best
    }

    fn context_stage(
        &self,
        target: &str,
        hay: &Haystack<'_>,
        context: Option<&MatchContext<'_>>,
    ) -> Option<FuzzyMatch> {
        let context = context.filter(|ctx| !ctx.is_empty())?;
        let target_len = char_len(target);
        let sizes: Vec<usize> = CONTEXT_FACTORS
            .iter()
            .map(|factor| scaled(target_len, *factor))
            .collect();
        let mut best: Option<FuzzyMatch> = None;

        let before = tail(context.before.trim_end(), CONTEXT_PROBE_CHARS);
        if !before.is_empty() {
            let probe_len = char_len(before);
            for at in find_all_char_indices(hay.text, before) {
                let mut start = at + probe_len;
                while start < hay.chars.len() && hay.chars[start].is_whitespace() {
                    start += 1;
                }
                for size in &sizes {
                    let end = (start + size).min(hay.chars.len());
                    if let Some(candidate) =
                        score_range(target, hay, start..end, MatchStage::ContextAnchored)
                    {
                        best = pick_better(best, candidate);
                    }
                }
            }
        }

        let after = head(context.after.trim_start(), CONTEXT_PROBE_CHARS);
        if !after.is_empty() {
            for at in find_all_char_indices(hay.text, after) {
                let mut end = at;
                while end > 0 && hay.chars[end - 1].is_whitespace() {
                    end -= 1;
                }
                for size in &sizes {
                    let start = end.saturating_sub(*size);
                    if let Some(candidate) =
                        score_range(target, hay, start..end, MatchStage::ContextAnchored)
                    {
                        best = pick_better(best, candidate);
                    }
                }
            }
        }
        best
    }

    fn partial_words_stage(
        &self,
        target: &str,
        hay: &Haystack<'_>,
        _context: Option<&MatchContext<'_>>,
    ) -> Option<FuzzyMatch> {
        let target_words = words(target).len();
        if target_words == 0 {
            return None;
        }
        let tokens = words(hay.text);
        let min_words = ((target_words + 1) / 2).max(1);

        let mut best: Option<FuzzyMatch> = None;
        for count in (min_words..=target_words).rev() {
            if count > tokens.len() {
                continue;
            }
            for first in 0..=tokens.len() - count {
                let range = tokens[first].range.start..tokens[first + count - 1].range.end;
                if let Some(candidate) = score_range(target, hay, range, MatchStage::PartialWords) {
                    best = pick_better(best, candidate);
                }
            }
        }
        best
    }
}

fn score_range(
    target: &str,
    hay: &Haystack<'_>,
    range: Range<usize>,
    stage: MatchStage,
) -> Option<FuzzyMatch> {
    let range = trim_range(&hay.chars, range);
    if range.is_empty() {
        return None;
    }
    let score = calculate_similarity(target, &hay.window(range.clone()));
    Some(FuzzyMatch {
        range,
        score,
        stage,
    })
}

/// Higher score wins; on ties the earlier candidate stays.
fn pick_better(current: Option<FuzzyMatch>, candidate: FuzzyMatch) -> Option<FuzzyMatch> {
    match current {
        Some(existing) if existing.score >= candidate.score => Some(existing),
        _ => Some(candidate),
    }
}

/// Among equal-text occurrences, the one whose surroundings best match the context.
fn pick_by_context(
    hay: &Haystack<'_>,
    ranges: Vec<Range<usize>>,
    context: Option<&MatchContext<'_>>,
) -> Option<Range<usize>> {
    let context = match context {
        Some(ctx) if ranges.len() > 1 && !ctx.is_empty() => ctx,
        _ => return ranges.into_iter().next(),
    };
    let before_len = char_len(context.before);
    let after_len = char_len(context.after);

    let mut best: Option<(f64, Range<usize>)> = None;
    for range in ranges {
        let mut score = 0.0;
        if before_len > 0 {
            let window = hay.window(range.start.saturating_sub(before_len)..range.start);
            score += calculate_similarity(context.before, &window);
        }
        if after_len > 0 {
            let end = (range.end + after_len).min(hay.chars.len());
            let window = hay.window(range.end..end);
            score += calculate_similarity(context.after, &window);
        }
        if best.as_ref().map_or(true, |(b, _)| score > *b) {
            best = Some((score, range));
        }
    }
    best.map(|(_, range)| range)
}

fn word_starts(chars: &[char]) -> Vec<usize> {
    (0..chars.len())
        .filter(|&i| {
            chars[i].is_alphanumeric() && (i == 0 || !chars[i - 1].is_alphanumeric())
        })
        .collect()
}

fn scaled(len: usize, factor: f64) -> usize {
    ((len as f64 * factor).round() as usize).max(1)
}

fn tail(input: &str, count: usize) -> &str {
    let len = char_len(input);
    crate::normalize::char_slice(input, len.saturating_sub(count)..len)
}

fn head(input: &str, count: usize) -> &str {
    crate::normalize::char_slice(input, 0..count)
}
