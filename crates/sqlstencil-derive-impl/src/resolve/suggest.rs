// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! "Did you mean" hints.

/// Largest edit distance still offered as a suggestion.
const MAX_DISTANCE: usize = 3;

/// Most suggestions listed.
const MAX_SUGGESTIONS: usize = 3;

/// Candidates within [`MAX_DISTANCE`] edits of `name`, closest first.
pub fn similar<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= MAX_DISTANCE)
        .collect();
    scored.sort_unstable();
    scored.dedup();
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate)
        .collect()
}

/// `message` followed by a hint listing close candidates, if any.
pub fn with_hint<'a>(
    message: String,
    name: &str,
    candidates: impl IntoIterator<Item = &'a str>
) -> String {
    let close = similar(name, candidates);
    if close.is_empty() {
        return message;
    }
    let quoted: Vec<String> = close.iter().map(|c| format!("`{c}`")).collect();
    format!("{message}; did you mean {}?", quoted.join(" or "))
}
