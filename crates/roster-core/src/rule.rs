//! Validation directives stored in the rule row.
//!
//! ```text
//! regex:^[0-9]+$            anchored pattern
//! list:active,inactive      literal allowed values
//! list:Students!A:A         allowed values read from another table
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::a1::RangeRef;
use crate::errors::CoreError;

/// Discriminant of a [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Regex,
    List,
}

impl RuleKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::List => "list",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a `list:` rule takes its allowed values from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    Literal(Vec<String>),
    Range(RangeRef),
}

/// A parsed rule cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    /// Text after the `kind:` prefix, exactly as stored.
    pub parameter: String,
}

impl Rule {
    /// Parse a rule cell. Blank cells carry no rule.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRule`] when the cell is not blank and does
    /// not start with `regex:` or `list:`.
    pub fn parse(cell: &str) -> Result<Option<Self>, CoreError> {
        let cell = cell.trim();
        if cell.is_empty() {
            return Ok(None);
        }
        let (kind, parameter) = cell
            .split_once(':')
            .ok_or_else(|| CoreError::InvalidRule(cell.to_string()))?;
        let kind = match kind.trim().to_ascii_lowercase().as_str() {
            "regex" => RuleKind::Regex,
            "list" => RuleKind::List,
            _ => return Err(CoreError::InvalidRule(cell.to_string())),
        };
        Ok(Some(Self {
            kind,
            parameter: parameter.to_string(),
        }))
    }

    #[must_use]
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Regex,
            parameter: pattern.into(),
        }
    }

    #[must_use]
    pub fn list(source: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::List,
            parameter: source.into(),
        }
    }

    /// Interpret the parameter of a `list:` rule.
    ///
    /// A parameter containing `!` is a range reference; anything else is a
    /// comma-separated literal list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRange`] if a range reference is malformed.
    pub fn list_source(&self) -> Result<ListSource, CoreError> {
        if self.parameter.contains('!') {
            return RangeRef::parse(&self.parameter).map(ListSource::Range);
        }
        Ok(ListSource::Literal(
            self.parameter
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect(),
        ))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.parameter)
    }
}
