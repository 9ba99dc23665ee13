//! Result Parser: the only enforcement point for the Plan schema.
//!
//! The refine stage is free text, so the parser locates the first balanced JSON
//! object (inside prose or code fences), decodes it strictly and rejects any
//! shape problem instead of repairing it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::strip_json_fences;

/// One synonym cluster: keywords with identical meaning.
pub type Item = Vec<String>;

/// Grouped keyword list. Serialized as `{"plan": [["a", "b"], ["c"]]}`,
/// which is also the persisted artifact format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    pub plan: Vec<Item>,
}

impl Plan {
    pub fn new(items: Vec<Item>) -> Self {
        Self { plan: items }
    }

    pub fn items(&self) -> &[Item] {
        &self.plan
    }

    pub fn keyword_count(&self) -> usize {
        self.plan.iter().map(Vec::len).sum()
    }

    /// Every Item non-empty, every keyword a non-blank string.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.plan.is_empty() {
            return Err(ParseError::EmptyPlan);
        }
        for (index, item) in self.plan.iter().enumerate() {
            if item.is_empty() {
                return Err(ParseError::EmptyItem { index });
            }
            if let Some(position) = item.iter().position(|k| k.trim().is_empty()) {
                return Err(ParseError::BlankKeyword {
                    item: index,
                    position,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Output contains no JSON object")]
    NoJsonObject,

    #[error("Output has unbalanced brackets starting at byte {start}")]
    Unbalanced { start: usize },

    #[error("Output does not match the plan schema: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Plan has no items")]
    EmptyPlan,

    #[error("Item {index} is empty")]
    EmptyItem { index: usize },

    #[error("Item {item} has a blank keyword at position {position}")]
    BlankKeyword { item: usize, position: usize },
}

/// Decodes free-text model output into a validated `Plan`.
///
/// Each `{` is tried in order as the start of the plan object; the first
/// balanced block that decodes as a `Plan` wins. If none does, the error of the
/// first candidate is returned.
pub fn parse_plan(text: &str) -> Result<Plan, ParseError> {
    let text = strip_json_fences(text);

    let mut first_error = None;
    for (start, _) in text.match_indices('{') {
        let decoded = extract_json_object(text, start)
            .and_then(|json| serde_json::from_str::<Plan>(json).map_err(ParseError::from));
        match decoded {
            Ok(plan) => {
                plan.validate()?;
                return Ok(plan);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or(ParseError::NoJsonObject))
}

/// Returns the balanced `{...}` block opening at byte `start`, honoring JSON
/// string escapes.
fn extract_json_object(text: &str, start: usize) -> Result<&str, ParseError> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return Err(ParseError::Unbalanced { start });
                }
                if stack.is_empty() {
                    return Ok(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    Err(ParseError::Unbalanced { start })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::prompts::PLAN_FORMAT_INSTRUCTIONS;

    fn plan(items: &[&[&str]]) -> Plan {
        Plan::new(
            items
                .iter()
                .map(|item| item.iter().map(|k| k.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_decode_of_encoded_plan_is_identity() {
        let original = plan(&[&["Python"], &["Machine Learning", "ML"], &["Statistics"]]);
        let encoded = serde_json::to_string(&original).unwrap();
        assert_eq!(parse_plan(&encoded).unwrap(), original);
    }

    #[test]
    fn test_parsing_twice_yields_equal_plans() {
        let text = r#"{"plan": [["SQL", "Structured Query Language"], ["Tableau"]]}"#;
        assert_eq!(parse_plan(text).unwrap(), parse_plan(text).unwrap());
    }

    #[test]
    fn test_single_keyword_plan() {
        let parsed = parse_plan(r#"{"plan": [["Python"]]}"#).unwrap();
        assert_eq!(parsed.items().len(), 1);
        assert_eq!(parsed.items()[0], vec!["Python".to_string()]);
        assert_eq!(parsed.keyword_count(), 1);
    }

    #[test]
    fn test_plan_wrapped_in_prose_and_fences() {
        let text = "Here is the refined plan:\n```json\n{\"plan\": [[\"ETL\"], [\"Spark\"]]}\n```\nLet me know!";
        assert_eq!(parse_plan(text).unwrap(), plan(&[&["ETL"], &["Spark"]]));
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_extraction() {
        let text = r#"{"plan": [["C{++}", "say \"}\""]]} trailing {"#;
        let parsed = parse_plan(text).unwrap();
        assert_eq!(parsed.items()[0][0], "C{++}");
        assert_eq!(parsed.items()[0][1], "say \"}\"");
    }

    #[test]
    fn test_braced_aside_before_plan_is_skipped() {
        let text = "Grouped per {meaning}:\n{\"plan\": [[\"ML\", \"Machine Learning\"]]}";
        assert_eq!(
            parse_plan(text).unwrap(),
            plan(&[&["ML", "Machine Learning"]])
        );
    }

    #[test]
    fn test_no_candidate_decodes_reports_first_error() {
        let err = parse_plan("Grouped per {meaning} and {\"other\": 1}").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_format_instruction_example_is_accepted() {
        let example = PLAN_FORMAT_INSTRUCTIONS
            .lines()
            .find(|l| l.starts_with("{\"plan\""))
            .unwrap();
        assert!(parse_plan(example).is_ok());
    }

    #[test]
    fn test_unbalanced_nesting_is_rejected() {
        let err = parse_plan(r#"{"plan": [["Python"], ["SQL"]}"#).unwrap_err();
        assert!(matches!(err, ParseError::Unbalanced { .. }));

        let err = parse_plan(r#"{"plan": [["Python"]"#).unwrap_err();
        assert!(matches!(err, ParseError::Unbalanced { .. }));
    }

    #[test]
    fn test_wrong_depth_is_rejected() {
        let err = parse_plan(r#"{"plan": ["Python", "SQL"]}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));

        let err = parse_plan(r#"{"plan": [[["Python"]]]}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_non_string_leaf_is_rejected() {
        let err = parse_plan(r#"{"plan": [["Python", 3]]}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = parse_plan(r#"{"plan": [["Python"]], "notes": "x"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_bare_array_is_rejected() {
        let err = parse_plan(r#"[["Python"], ["SQL"]]"#).unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObject));
    }

    #[test]
    fn test_empty_shapes_are_rejected() {
        assert!(matches!(
            parse_plan(r#"{"plan": []}"#).unwrap_err(),
            ParseError::EmptyPlan
        ));
        assert!(matches!(
            parse_plan(r#"{"plan": [["Python"], []]}"#).unwrap_err(),
            ParseError::EmptyItem { index: 1 }
        ));
        assert!(matches!(
            parse_plan(r#"{"plan": [["Python", "  "]]}"#).unwrap_err(),
            ParseError::BlankKeyword {
                item: 0,
                position: 1
            }
        ));
    }
}
