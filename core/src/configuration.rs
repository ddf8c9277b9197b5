//! Build-configuration identity resolution.
//!
//! Legacy projects scope property and item groups with conditions of the
//! canonical form `'$(Configuration)|$(Platform)'=='Debug|AnyCPU'`. This
//! module parses that shape into a [`Configuration`] (an ordered list of
//! dimension/value pairs), renders it back, and produces the `|`-joined
//! identity string used to key diffs.
//!
//! Only the canonical shape is recognized. Anything else (boolean operators,
//! property functions, partial comparisons) is an error; callers must treat
//! the owning group as unconditioned rather than guess a binding.

use crate::error_codes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConditionParseError {
    #[error(
        "[SDKIFY_COND_001] condition is not a single '==' comparison: `{condition}`. Suggestion: only `'$(A)|$(B)'=='x|y'` conditions are recognized."
    )]
    NotAComparison { condition: String },
    #[error(
        "[SDKIFY_COND_002] comparison operand is not single-quoted: `{operand}`. Suggestion: quote both sides of the condition."
    )]
    UnquotedOperand { operand: String },
    #[error(
        "[SDKIFY_COND_003] `{token}` is not a bare `$(Name)` dimension reference. Suggestion: only plain property references may appear on the left-hand side."
    )]
    BadDimension { token: String },
    #[error(
        "[SDKIFY_COND_004] condition has {dimensions} dimension(s) but {values} value(s). Suggestion: both sides must list the same number of `|`-separated entries."
    )]
    ArityMismatch { dimensions: usize, values: usize },
}

impl ConditionParseError {
    pub fn code(&self) -> &'static str {
        match self {
            ConditionParseError::NotAComparison { .. } => error_codes::COND_NOT_COMPARISON,
            ConditionParseError::UnquotedOperand { .. } => error_codes::COND_UNQUOTED,
            ConditionParseError::BadDimension { .. } => error_codes::COND_BAD_DIMENSION,
            ConditionParseError::ArityMismatch { .. } => error_codes::COND_ARITY,
        }
    }
}

/// One point in the cross-product of build dimensions, e.g.
/// `Configuration=Debug, Platform=AnyCPU`. The empty configuration stands
/// for the unconditioned default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Configuration {
    dimensions: Vec<(String, String)>,
}

impl Configuration {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs(dimensions: &[(&str, &str)]) -> Self {
        Self {
            dimensions: dimensions
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn dimensions(&self) -> &[(String, String)] {
        &self.dimensions
    }

    /// Value of one dimension, by case-insensitive name.
    pub fn value_of(&self, dimension: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(dimension))
            .map(|(_, value)| value.as_str())
    }

    /// The canonical identity: `|`-joined values in declaration order.
    /// Empty string for the unconditioned configuration.
    pub fn identity(&self) -> String {
        self.dimensions
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Renders the canonical condition expression. The empty configuration
    /// renders to an empty string (no condition attribute).
    pub fn render(&self) -> String {
        if self.dimensions.is_empty() {
            return String::new();
        }
        let lhs = self
            .dimensions
            .iter()
            .map(|(name, _)| format!("$({name})"))
            .collect::<Vec<_>>()
            .join("|");
        let rhs = self.identity();
        format!("'{lhs}'=='{rhs}'")
    }

    /// Parses the canonical condition shape. Whitespace around `==` and at
    /// the ends is tolerated; everything else must match exactly.
    pub fn parse(condition: &str) -> Result<Configuration, ConditionParseError> {
        let trimmed = condition.trim();
        if trimmed.is_empty() {
            return Ok(Configuration::empty());
        }

        let (lhs, rhs) = split_comparison(trimmed)?;
        let lhs = unquote(lhs)?;
        let rhs = unquote(rhs)?;

        let dim_tokens: Vec<&str> = lhs.split('|').collect();
        let values: Vec<&str> = rhs.split('|').collect();
        if dim_tokens.len() != values.len() {
            return Err(ConditionParseError::ArityMismatch {
                dimensions: dim_tokens.len(),
                values: values.len(),
            });
        }

        let mut dimensions = Vec::with_capacity(dim_tokens.len());
        for (token, value) in dim_tokens.iter().zip(values.iter()) {
            let name = parse_dimension_token(token)?;
            dimensions.push((name.to_string(), value.to_string()));
        }

        Ok(Configuration { dimensions })
    }
}

fn split_comparison(condition: &str) -> Result<(&str, &str), ConditionParseError> {
    let mut parts = condition.splitn(2, "==");
    let lhs = parts.next().unwrap_or("");
    let rhs = match parts.next() {
        Some(rhs) => rhs,
        None => {
            return Err(ConditionParseError::NotAComparison {
                condition: condition.to_string(),
            });
        }
    };
    if rhs.contains("==") {
        return Err(ConditionParseError::NotAComparison {
            condition: condition.to_string(),
        });
    }
    Ok((lhs.trim(), rhs.trim()))
}

fn unquote(operand: &str) -> Result<&str, ConditionParseError> {
    let stripped = operand
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''));
    match stripped {
        Some(inner) if !inner.contains('\'') => Ok(inner),
        _ => Err(ConditionParseError::UnquotedOperand {
            operand: operand.to_string(),
        }),
    }
}

fn parse_dimension_token(token: &str) -> Result<&str, ConditionParseError> {
    let bad = || ConditionParseError::BadDimension {
        token: token.to_string(),
    };
    let name = token
        .strip_prefix("$(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(bad)?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(bad());
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_dimension_condition() {
        let config =
            Configuration::parse("'$(Configuration)|$(Platform)'=='Debug|AnyCPU'").unwrap();
        assert_eq!(
            config.dimensions(),
            &[
                ("Configuration".to_string(), "Debug".to_string()),
                ("Platform".to_string(), "AnyCPU".to_string()),
            ]
        );
        assert_eq!(config.identity(), "Debug|AnyCPU");
    }

    #[test]
    fn parses_single_dimension_with_whitespace() {
        let config = Configuration::parse("  '$(Configuration)' == 'Release' ").unwrap();
        assert_eq!(config.identity(), "Release");
    }

    #[test]
    fn empty_condition_is_the_unconditioned_configuration() {
        let config = Configuration::parse("").unwrap();
        assert!(config.is_empty());
        assert_eq!(config.identity(), "");
        assert_eq!(config.render(), "");
    }

    #[test]
    fn round_trip_parse_render() {
        for condition in [
            "'$(Configuration)'=='Debug'",
            "'$(Configuration)|$(Platform)'=='Release|x64'",
            "'$(A)|$(B)|$(C)'=='1|2|3'",
        ] {
            let config = Configuration::parse(condition).unwrap();
            assert_eq!(Configuration::parse(&config.render()).unwrap(), config);
        }
    }

    #[test]
    fn rejects_boolean_conditions() {
        // the second `==` lands in the right-hand side of the first split
        let err = Configuration::parse("'$(A)'=='x' And '$(B)'=='y'").unwrap_err();
        assert!(matches!(err, ConditionParseError::NotAComparison { .. }));
    }

    #[test]
    fn rejects_double_comparison() {
        let err = Configuration::parse("'$(A)'=='x'=='y'").unwrap_err();
        assert!(matches!(err, ConditionParseError::NotAComparison { .. }));
    }

    #[test]
    fn rejects_function_calls_on_lhs() {
        let err = Configuration::parse("'$(A.ToLower())'=='x'").unwrap_err();
        assert!(matches!(err, ConditionParseError::BadDimension { .. }));
    }

    #[test]
    fn rejects_arity_mismatch() {
        let err = Configuration::parse("'$(A)|$(B)'=='x'").unwrap_err();
        assert_eq!(
            err,
            ConditionParseError::ArityMismatch {
                dimensions: 2,
                values: 1
            }
        );
    }

    #[test]
    fn value_lookup_is_case_insensitive() {
        let config = Configuration::parse("'$(Configuration)'=='Debug'").unwrap();
        assert_eq!(config.value_of("configuration"), Some("Debug"));
        assert_eq!(config.value_of("Platform"), None);
    }
}
