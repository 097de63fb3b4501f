use serde::Serialize;
use std::collections::HashSet;

use crate::lexicon::Lexicon;

mod expand;

pub use expand::{close_japanese, expand_to_japanese};

const DELIMITERS: [char; 2] = [',', '、'];

/// Normalized ingredient terms for one request, one ordered list per language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngredientTermSet {
    pub english: Vec<String>,
    pub japanese: Vec<String>,
}

impl IngredientTermSet {
    pub fn is_empty(&self) -> bool {
        self.english.is_empty() && self.japanese.is_empty()
    }
}

/// Insertion-ordered list that silently drops repeats.
#[derive(Debug, Default)]
pub(crate) struct OrderedTerms {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedTerms {
    pub(crate) fn push(&mut self, term: impl Into<String>) {
        let term = term.into();
        if self.seen.insert(term.clone()) {
            self.items.push(term);
        }
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Splits manual input on `,` and `、`, trimming pieces and dropping blanks.
pub fn split_terms(input: &str) -> Vec<String> {
    input
        .split(DELIMITERS)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when the term carries kana, CJK ideographs or full-width forms.
pub fn is_japanese(term: &str) -> bool {
    term.chars().any(|ch| {
        matches!(ch,
            '\u{3040}'..='\u{309F}'
            | '\u{30A0}'..='\u{30FF}'
            | '\u{31F0}'..='\u{31FF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{FF00}'..='\u{FFEF}')
    })
}

pub fn normalize<S: AsRef<str>>(lexicon: &Lexicon, raw_terms: &[S]) -> IngredientTermSet {
    let mut english = OrderedTerms::default();
    let mut japanese = OrderedTerms::default();

    for raw in raw_terms {
        for piece in split_terms(raw.as_ref()) {
            if is_japanese(&piece) {
                if let Some(counterpart) = lexicon.japanese_counterpart(&piece) {
                    let counterpart = counterpart.to_string();
                    japanese.push(piece);
                    japanese.push(counterpart);
                } else {
                    japanese.push(piece);
                }
            } else {
                english.push(normalize_english(lexicon, &piece));
            }
        }
    }

    IngredientTermSet {
        english: english.into_vec(),
        japanese: japanese.into_vec(),
    }
}

pub fn normalize_english(lexicon: &Lexicon, term: &str) -> String {
    let folded = term
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    lexicon.canonical_english(&folded).to_string()
}
