use crate::lexicon::Lexicon;

use super::OrderedTerms;

/// Best-effort English -> Japanese lookup. Terms without a lexicon entry are
/// skipped; this is enrichment, not translation.
pub fn expand_to_japanese<S: AsRef<str>>(lexicon: &Lexicon, english_terms: &[S]) -> Vec<String> {
    let mut out = OrderedTerms::default();
    for term in english_terms {
        let term = term.as_ref().trim();
        if term.is_empty() {
            continue;
        }
        if let Some(japanese) = lexicon.english_to_japanese(term) {
            out.push(japanese);
        }
    }
    out.into_vec()
}

/// Adds the synonym counterpart of every term right after it.
pub fn close_japanese<S: AsRef<str>>(lexicon: &Lexicon, japanese_terms: &[S]) -> Vec<String> {
    let mut out = OrderedTerms::default();
    for term in japanese_terms {
        let term = term.as_ref().trim();
        if term.is_empty() {
            continue;
        }
        out.push(term);
        if let Some(counterpart) = lexicon.japanese_counterpart(term) {
            out.push(counterpart);
        }
    }
    out.into_vec()
}
