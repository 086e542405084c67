// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! String similarity measures used to score OCR output

use std::collections::{HashMap, HashSet};

/// Strip spaces and newlines for character-level comparison
pub fn normalize_for_comparison(text: &str) -> String {
    text.chars().filter(|c| *c != ' ' && *c != '\n').collect()
}

/// Levenshtein distance in characters (unit cost insert/delete/substitute)
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Ratcliff/Obershelp similarity `2M / T`
///
/// `M` counts characters in matching blocks found by recursively taking the
/// longest common block and repeating on both sides of it; `T` is the total
/// length of both strings. Two empty strings are identical (1.0).
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_characters(&a, &b) as f64 / total as f64
}

/// Total characters covered by matching blocks
pub fn matched_characters(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, ch) in b.iter().enumerate() {
        b2j.entry(*ch).or_default().push(j);
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`
///
/// Ties resolve to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run length of the block ending at a[i-1], b[j]
    let mut run_ending_at: HashMap<usize, usize> = HashMap::new();

    for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_runs = HashMap::new();
        if let Some(positions) = b2j.get(ch) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let run = if j > 0 {
                    run_ending_at.get(&(j - 1)).copied().unwrap_or(0)
                } else {
                    0
                } + 1;
                next_runs.insert(j, run);
                if run > best_size {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best_size = run;
                }
            }
        }
        run_ending_at = next_runs;
    }

    (best_i, best_j, best_size)
}

/// Share of ground-truth tokens present anywhere in the recognized text
///
/// Membership only: order and repeat counts are ignored.
pub fn word_match_rate(ground_truth: &str, recognized: &str) -> f64 {
    let expected: Vec<&str> = ground_truth.split_whitespace().collect();
    if expected.is_empty() {
        return 0.0;
    }
    let found: HashSet<&str> = recognized.split_whitespace().collect();
    let hits = expected.iter().filter(|token| found.contains(*token)).count();
    hits as f64 / expected.len() as f64
}
