//! Community glossary for `/define` and `/add_definition`.

use crate::store::{Collection, StoreError};
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Minimum Jaro-Winkler similarity for a fuzzy term match.
const FUZZY_THRESHOLD: f64 = 0.88;

pub const USAGE: &str = "Definition format is as follows:\n`Term: Definition #optional #keywords #here`\nUse \\n for a literal newline in definition field.";
pub const INCOMPLETE: &str = "Incorrect format. Definition format is as follows:\n`Term: Definition #optional #keywords #here`";
pub const BAD_MARKDOWN: &str = "Error in definition format (check your Markdown! These literals must be escaped: ][*_`)";
pub const NOT_FOUND: &str = "No definition for the given term found.\n(use /add\\_definition to contribute one)";

static DEFINITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?):(.*?)([^\\]#\w.*)?$").expect("static definition pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub term: String,
    /// Lowercase term, also the collection key
    pub index: String,
    pub keywords: Vec<String>,
    pub definition: String,
    pub contributor: String,
    pub last_edit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("entry does not match 'Term: Definition #keywords'")]
    Format,

    #[error("term or definition is empty")]
    Incomplete,
}

impl DefinitionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DefinitionError::Format => USAGE,
            DefinitionError::Incomplete => INCOMPLETE,
        }
    }
}

impl Definition {
    pub fn render(&self) -> String {
        format!(
            "*{}*: {}\n(Contributed by {} _{}_)",
            self.term, self.definition, self.contributor, self.last_edit
        )
    }
}

/// Parse `Term: Definition #optional #keywords`.
///
/// `\#` keeps a literal hash inside the definition and `\n` becomes a line
/// break. Without tags the keywords are the words of the term.
pub fn parse_definition(
    entry: &str,
    contributor: &str,
    last_edit: &str,
) -> Result<Definition, DefinitionError> {
    let caps = DEFINITION_REGEX
        .captures(entry.trim())
        .ok_or(DefinitionError::Format)?;

    let term = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
    let raw_definition = caps.get(2).map_or("", |m| m.as_str());
    let tags = caps.get(3).map_or("", |m| m.as_str());

    // The tag group swallows the character before the first '#'
    let (raw_definition, tags) = match tags.char_indices().nth(1) {
        Some((split, _)) => (format!("{}{}", raw_definition, &tags[..split]), &tags[split..]),
        None => (raw_definition.to_string(), tags),
    };
    let definition = raw_definition
        .trim()
        .replace("\\#", "#")
        .replace("\\n", "\n");

    if term.is_empty() || definition.is_empty() {
        return Err(DefinitionError::Incomplete);
    }

    let mut keywords: Vec<String> = tags
        .split('#')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();
    if keywords.is_empty() {
        keywords = term.to_lowercase().split_whitespace().map(str::to_string).collect();
    }

    Ok(Definition {
        index: term.to_lowercase(),
        term,
        keywords,
        definition,
        contributor: contributor.to_string(),
        last_edit: last_edit.to_string(),
    })
}

#[derive(Deserialize)]
struct QCode {
    code: String,
    query: String,
    answer: String,
}

/// Seed definitions from a `[{code, query, answer}]` Q-code list.
pub fn parse_qcodes(json: &str) -> anyhow::Result<Vec<Definition>> {
    let codes: Vec<QCode> = serde_json::from_str(json).context("Malformed Q-code list")?;
    Ok(codes
        .into_iter()
        .map(|code| Definition {
            index: code.code.to_lowercase(),
            keywords: vec![code.code.to_lowercase()],
            definition: format!(
                "*Question:* _{}_\n*Answer:* {}\n[Source](https://en.wikipedia.org/wiki/Q_code#Q_codes_as_adapted_for_use_in_amateur_radio)",
                code.query, code.answer
            ),
            term: code.code,
            contributor: "HamFursBot".to_string(),
            last_edit: "2017-01-02 12:00:00".to_string(),
        })
        .collect())
}

pub struct Glossary {
    definitions: Collection<Definition>,
}

impl Glossary {
    pub fn new(definitions: Collection<Definition>) -> Self {
        Self { definitions }
    }

    /// Exact term, then keyword, then the closest similar term.
    pub async fn lookup(&self, term: &str) -> Option<Definition> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }

        if let Some(definition) = self.definitions.get(&term).await {
            return Some(definition);
        }
        if let Some(definition) = self
            .definitions
            .find(|d| d.keywords.iter().any(|k| *k == term))
            .await
        {
            return Some(definition);
        }

        self.definitions
            .values()
            .await
            .into_iter()
            .map(|d| (strsim::jaro_winkler(&term, &d.index), d))
            .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, d)| d)
    }

    /// Insert or replace by lowercase term. Returns `true` on replace.
    pub async fn save(&self, definition: Definition) -> Result<bool, StoreError> {
        self.definitions.upsert(definition.index.clone(), definition).await
    }
}
