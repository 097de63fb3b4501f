use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::HashMap;

/// Katakana/kanji pairs naming the same ingredient. Lookups work in both
/// directions and never match partially.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    pairs: HashMap<String, String>,
}

impl SynonymTable {
    pub fn from_pairs<I, A, B>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut table = HashMap::new();
        for (left, right) in pairs {
            let left = left.into();
            let right = right.into();
            if left == right {
                return Err(anyhow!("synonym pair maps '{}' onto itself", left));
            }
            for term in [&left, &right] {
                if table.contains_key(term) {
                    return Err(anyhow!("synonym term '{}' appears in more than one pair", term));
                }
            }
            table.insert(left.clone(), right.clone());
            table.insert(right, left);
        }
        Ok(Self { pairs: table })
    }

    pub fn counterpart(&self, term: &str) -> Option<&str> {
        self.pairs.get(term).map(String::as_str)
    }

    /// Every (term, counterpart) entry; each pair shows up once per direction.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(term, counterpart)| (term.as_str(), counterpart.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Static vocabulary shared by the normalizer, the expander and the detectors.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    synonyms: SynonymTable,
    aliases: HashMap<String, String>,
    japanese: HashMap<String, String>,
}

impl Lexicon {
    pub fn load() -> Result<Self> {
        let synonyms: SynonymFile = toml::from_str(include_str!("synonyms.toml"))
            .with_context(|| "failed to parse synonym table")?;
        let english: EnglishFile = toml::from_str(include_str!("english.toml"))
            .with_context(|| "failed to parse english lexicon")?;
        Self::from_parts(synonyms.pairs, english.aliases, english.japanese)
    }

    pub fn from_parts(
        pairs: Vec<(String, String)>,
        aliases: HashMap<String, String>,
        japanese: HashMap<String, String>,
    ) -> Result<Self> {
        let synonyms = SynonymTable::from_pairs(pairs)?;
        let aliases = aliases
            .into_iter()
            .map(|(from, to)| (normalize_key(&from), normalize_key(&to)))
            .collect();
        let japanese = japanese
            .into_iter()
            .map(|(english, japanese)| (normalize_key(&english), japanese.trim().to_string()))
            .collect();
        Ok(Self {
            synonyms,
            aliases,
            japanese,
        })
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn japanese_counterpart(&self, term: &str) -> Option<&str> {
        self.synonyms.counterpart(term)
    }

    /// Collapses a lowercase English spelling onto its catalog term.
    pub fn canonical_english<'a>(&'a self, term: &'a str) -> &'a str {
        self.aliases.get(term).map(String::as_str).unwrap_or(term)
    }

    pub fn english_to_japanese(&self, term: &str) -> Option<&str> {
        self.japanese.get(&normalize_key(term)).map(String::as_str)
    }

    pub fn english_terms(&self) -> impl Iterator<Item = &str> {
        self.japanese.keys().map(String::as_str)
    }
}

fn normalize_key(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[derive(Debug, Deserialize)]
struct SynonymFile {
    pairs: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct EnglishFile {
    #[serde(default)]
    aliases: HashMap<String, String>,
    #[serde(default)]
    japanese: HashMap<String, String>,
}
