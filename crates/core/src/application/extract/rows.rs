// Structured extraction - table rows from raw text
use crate::application::escalation::log_recoverable;
use crate::domain::error::{DomainError, Result};
use crate::domain::Row;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// The only recognized extraction kind
pub const REGEX_KIND: &str = "regex";

/// Wildcard placed between consecutive path fragments
pub const FRAGMENT_GLUE: &str = ".*?";

/// Row parser configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub path: Option<PathSpec>,
}

/// Pattern of a row: one regex, or column anchors joined by a lazy wildcard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    Pattern(String),
    Fragments(Vec<String>),
    /// Any other configured shape; rejected by validation
    Invalid(serde_json::Value),
}

impl ParserConfig {
    pub fn regex(path: PathSpec) -> Self {
        Self {
            kind: Some(REGEX_KIND.to_string()),
            path: Some(path),
        }
    }

    /// Validate and compile into a single dot-matches-newline pattern
    pub fn compile(&self) -> Result<Regex> {
        match self.kind.as_deref() {
            Some(REGEX_KIND) => {}
            other => {
                return Err(DomainError::InvalidParser(format!(
                    "invalid or missing parser type: {:?}",
                    other
                )))
            }
        }

        let pattern = match &self.path {
            Some(PathSpec::Pattern(p)) => p.clone(),
            Some(PathSpec::Fragments(parts)) => parts.join(FRAGMENT_GLUE),
            Some(PathSpec::Invalid(v)) => {
                return Err(DomainError::InvalidParser(format!(
                    "invalid parser path: {}",
                    v
                )))
            }
            None => {
                return Err(DomainError::InvalidParser(
                    "missing parser path".to_string(),
                ))
            }
        };

        RegexBuilder::new(&pattern)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| DomainError::InvalidPattern(e.to_string()))
    }
}

/// Extract one row per match of the parser's pattern
///
/// Invalid configuration is logged and yields an empty sequence.
pub fn extract_rows<'t>(config: &ParserConfig, text: &'t str) -> Rows<'t> {
    match config.compile() {
        Ok(regex) => Rows::new(regex, text),
        Err(e) => {
            log_recoverable(&e, Some("row extraction"));
            Rows::empty(text)
        }
    }
}

/// Lazy, finite, single-pass sequence of rows
///
/// Keys are the named capture groups that participated in the match.
pub struct Rows<'t> {
    regex: Option<Regex>,
    names: Vec<String>,
    text: &'t str,
    pos: usize,
    last_end: Option<usize>,
}

impl<'t> Rows<'t> {
    fn new(regex: Regex, text: &'t str) -> Self {
        let names = regex.capture_names().flatten().map(str::to_string).collect();
        Self {
            regex: Some(regex),
            names,
            text,
            pos: 0,
            last_end: None,
        }
    }

    fn empty(text: &'t str) -> Self {
        Self {
            regex: None,
            names: Vec::new(),
            text,
            pos: 0,
            last_end: None,
        }
    }
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let regex = self.regex.as_ref()?;

        loop {
            if self.pos > self.text.len() {
                return None;
            }
            let caps = regex.captures_at(self.text, self.pos)?;
            let whole = caps.get(0)?;
            let end = whole.end();

            if whole.is_empty() {
                // Step past one char so an empty match cannot repeat forever
                self.pos = end + self.text[end..].chars().next().map_or(1, char::len_utf8);
                if self.last_end == Some(end) {
                    continue;
                }
            } else {
                self.pos = end;
            }
            self.last_end = Some(end);

            return Some(
                self.names
                    .iter()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.clone(), m.as_str().to_string()))
                    })
                    .collect(),
            );
        }
    }
}
