//! Bag-of-words featurization over a fixed, pre-stemmed vocabulary.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::porter;

// Words (with an optional contraction tail) and standalone punctuation marks.
static WORD_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\w+(?:'\w+)?|[^\w\s]").ok());

// Contraction tails split into their own token, as Treebank tokenization does.
const CLITICS: &[&str] = &["n't", "'ll", "'re", "'ve", "'s", "'m", "'d"];

// Fused forms split at a fixed offset.
const FUSED: &[(&str, usize)] = &[
    ("cannot", 3),
    ("gimme", 3),
    ("gonna", 3),
    ("gotta", 3),
    ("lemme", 3),
    ("wanna", 3),
];

fn split_token(token: &str, out: &mut Vec<String>) {
    for clitic in CLITICS {
        let cut = token.len().saturating_sub(clitic.len());
        if cut > 0
            && token.is_char_boundary(cut)
            && token[cut..].eq_ignore_ascii_case(clitic)
        {
            out.push(token[..cut].to_string());
            out.push(token[cut..].to_string());
            return;
        }
    }

    if let Some((_, at)) = FUSED.iter().find(|(word, _)| token.eq_ignore_ascii_case(word)) {
        out.push(token[..*at].to_string());
        out.push(token[*at..].to_string());
        return;
    }

    out.push(token.to_string());
}

/// Split raw text into word-level tokens, with contraction tails
/// (`n't`, `'s`, `'re` ...) as separate tokens.
///
/// Falls back to whitespace splitting if the word pattern is unavailable.
pub fn tokenize(text: &str) -> Vec<String> {
    match WORD_RE.as_ref() {
        Some(re) => {
            let mut tokens = Vec::new();
            for m in re.find_iter(text) {
                split_token(m.as_str(), &mut tokens);
            }
            tokens
        }
        None => text.split_whitespace().map(str::to_string).collect(),
    }
}

/// Lowercase and Porter-stem a single token.
pub fn stem(word: &str) -> String {
    porter::stem_word(&word.to_lowercase())
}

/// Produce a 0/1 vector aligned to `vocabulary`. Vocabulary entries are
/// expected to be stored already stemmed, as the training step writes them.
pub fn featurize(text: &str, vocabulary: &[String]) -> Vec<f32> {
    let stems: HashSet<String> = tokenize(text).iter().map(|t| stem(t)).collect();

    vocabulary
        .iter()
        .map(|word| if stems.contains(word) { 1.0 } else { 0.0 })
        .collect()
}
