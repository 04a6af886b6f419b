use crate::record::{Interpretation, SkipIf};
use std::fmt;

/// Comment prefix recognized by the jstests harness.
pub const REFTEST_PREFIX: &str = "// |reftest| ";

/// The `|reftest|` directive of a converted test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReftestAnnotation {
    /// Reasons for an unconditional skip
    pub skip: Vec<String>,

    /// Conditional skips
    pub skip_if: Vec<SkipIf>,

    /// Expected error type of a negative test
    pub error: Option<String>,

    /// Source is module code
    pub module: bool,
}

impl ReftestAnnotation {
    pub fn from_interpretation(interpretation: &Interpretation) -> Self {
        let record = &interpretation.record;
        Self {
            skip: interpretation.skip.clone(),
            skip_if: interpretation.skip_if.clone(),
            error: record.negative.as_ref().map(|n| n.error_type.clone()),
            module: record.module,
        }
    }

    /// Directive terms in harness order.
    pub fn terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        if !self.skip.is_empty() {
            terms.push("skip".to_string());
        }
        if !self.skip_if.is_empty() {
            let conditions: Vec<&str> = self.skip_if.iter().map(|s| s.condition.as_str()).collect();
            terms.push(format!("skip-if({})", conditions.join("||")));
        }
        if let Some(error) = &self.error {
            terms.push(format!("error:{error}"));
        }
        if self.module {
            terms.push("module".to_string());
        }
        terms
    }

    /// Skip reasons followed by conditional-skip comments.
    pub fn comments(&self) -> Vec<&str> {
        self.skip
            .iter()
            .map(String::as_str)
            .chain(self.skip_if.iter().map(|s| s.comment.as_str()))
            .collect()
    }

    /// Render the directive body; empty when no term applies.
    pub fn render(&self) -> String {
        let mut line = self.terms().join(" ");
        let comments = self.comments();
        if !comments.is_empty() {
            line.push_str(" -- ");
            line.push_str(&comments.join(", "));
        }
        line
    }
}

impl fmt::Display for ReftestAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn skip_if(condition: &str, comment: &str) -> SkipIf {
        SkipIf {
            condition: condition.to_string(),
            comment: comment.to_string(),
        }
    }

    #[test]
    fn empty_annotation_renders_nothing() {
        let annotation = ReftestAnnotation::default();
        assert!(annotation.terms().is_empty());
        assert_eq!(annotation.render(), "");
    }

    #[test]
    fn terms_without_comments_have_no_separator() {
        let annotation = ReftestAnnotation {
            error: Some("SyntaxError".to_string()),
            module: true,
            ..Default::default()
        };
        assert_eq!(annotation.render(), "error:SyntaxError module");
    }

    #[test]
    fn all_terms_in_order() {
        let annotation = ReftestAnnotation {
            skip: vec!["has YAML errors".to_string(), "not a test file".to_string()],
            skip_if: vec![
                skip_if("release_or_beta", "Atomics is not released yet"),
                skip_if("!xulRuntime.shell", "needs shell"),
            ],
            error: Some("TypeError".to_string()),
            module: true,
        };
        assert_eq!(
            annotation.to_string(),
            "skip skip-if(release_or_beta||!xulRuntime.shell) error:TypeError module \
             -- has YAML errors, not a test file, Atomics is not released yet, needs shell"
        );
    }

    #[test]
    fn conditional_skip_only() {
        let annotation = ReftestAnnotation {
            skip_if: vec![skip_if("release_or_beta", "Atomics is not released yet")],
            ..Default::default()
        };
        assert_eq!(
            annotation.render(),
            "skip-if(release_or_beta) -- Atomics is not released yet"
        );
    }
}
