//! Structural validation.
//!
//! [`validate`] checks rules the grammar does not enforce, for trees built
//! by hand or rewritten by a pass. Problems are collected, not raised: each
//! one is a `"{NodeType}.{Field}: message"` string, and the caller decides
//! whether to turn them into an error with [`ValidationResult::into_result`].

use std::sync::Arc;

use tracing::debug;

use crate::ast::{
    AliasNode, BetweenNode, CaseNode, DataTypeNode, JoinNode, MergeAction, MergeMatchKind,
    MergeMatchNode, Node, SelectNode, WithNode,
};
use crate::lexer::Keyword;
use crate::visit::{
    walk_alias, walk_between, walk_case, walk_join, walk_merge_match, walk_select, walk_with,
    Visitor,
};

/// The outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// True if no rule failed.
    pub passed: bool,
    /// One message per failed rule, in tree order.
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Converts a failed result into an error.
    ///
    /// # Errors
    ///
    /// Returns every collected message if any rule failed.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.passed {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}

/// The messages of a failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", .errors.join("; "))]
pub struct ValidationError {
    /// The collected messages.
    pub errors: Vec<String>,
}

/// Validates `node` and everything below it.
#[must_use]
pub fn validate(node: &Node) -> ValidationResult {
    let mut validator = Validator::default();
    node.accept(&mut validator);
    debug!(kind = node.kind_name(), errors = validator.errors.len(), "validated");
    ValidationResult {
        passed: validator.errors.is_empty(),
        errors: validator.errors,
    }
}

impl Node {
    /// Shorthand for [`validate`].
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        validate(self)
    }
}

#[derive(Default)]
struct Validator {
    errors: Vec<String>,
}

impl Validator {
    fn error(&mut self, node: &str, field: &str, message: impl AsRef<str>) {
        self.errors.push(format!("{node}.{field}: {}", message.as_ref()));
    }

    fn check_data_type(&mut self, data_type: &DataTypeNode) {
        if data_type.is_character() {
            if let Some(length) = data_type.length() {
                if length <= 0 {
                    self.error(
                        "DataTypeNode",
                        "Arguments",
                        format!("{} length must be positive, got {length}", data_type.name),
                    );
                }
            }
        }
        if matches!(data_type.keyword(), Some(Keyword::Decimal | Keyword::Numeric)) {
            if let (Some(precision), Some(scale)) = (data_type.argument(0), data_type.argument(1)) {
                if scale > precision {
                    self.error(
                        "DataTypeNode",
                        "Arguments",
                        format!("scale {scale} exceeds precision {precision}"),
                    );
                }
            }
        }
    }
}

impl Visitor for Validator {
    fn visit_alias(&mut self, node: &Arc<AliasNode>) -> Node {
        if node.source.is_none() {
            self.error("AliasNode", "Source", "source is required");
        }
        if node.alias.is_none() {
            self.error("AliasNode", "Alias", "alias is required");
        }
        walk_alias(self, node)
    }

    fn visit_between(&mut self, node: &Arc<BetweenNode>) -> Node {
        let (low, high) = (&node.low, &node.high);
        if low.is_literal() && high.is_literal() && low.kind_name() != high.kind_name() {
            self.error(
                "BetweenNode",
                "High",
                format!(
                    "bounds must be of the same kind, got {} and {}",
                    low.kind_name(),
                    high.kind_name()
                ),
            );
        }
        walk_between(self, node)
    }

    fn visit_case(&mut self, node: &Arc<CaseNode>) -> Node {
        if node.whens.is_empty() {
            self.error("CaseNode", "Whens", "at least one WHEN is required");
        }
        walk_case(self, node)
    }

    fn visit_data_type(&mut self, node: &Arc<DataTypeNode>) -> Node {
        self.check_data_type(node);
        Node::DataType(Arc::clone(node))
    }

    fn visit_select(&mut self, node: &Arc<SelectNode>) -> Node {
        // `fetch` is T-SQL only; PostgreSQL FETCH FIRST parses as `limit`.
        if node.fetch.is_some() && node.offset.is_none() {
            self.error("SelectNode", "Fetch", "FETCH requires OFFSET");
        }
        if node.top.is_some() && (node.offset.is_some() || node.fetch.is_some()) {
            self.error("SelectNode", "Top", "TOP cannot be combined with OFFSET or FETCH");
        }
        walk_select(self, node)
    }

    fn visit_join(&mut self, node: &Arc<JoinNode>) -> Node {
        let operator = node.operator;
        match (operator.requires_condition(), node.condition.is_some()) {
            (true, false) => self.error(
                "JoinNode",
                "Condition",
                format!("{} requires an ON condition", operator.as_str()),
            ),
            (false, true) => self.error(
                "JoinNode",
                "Condition",
                format!("{} does not take an ON condition", operator.as_str()),
            ),
            _ => {}
        }
        walk_join(self, node)
    }

    fn visit_merge_match(&mut self, node: &Arc<MergeMatchNode>) -> Node {
        let allowed = match node.kind {
            MergeMatchKind::Matched | MergeMatchKind::NotMatchedBySource => {
                matches!(node.action, MergeAction::Update(_) | MergeAction::Delete)
            }
            MergeMatchKind::NotMatchedByTarget => matches!(node.action, MergeAction::Insert { .. }),
        };
        if !allowed {
            self.error(
                "MergeMatchNode",
                "Action",
                format!(
                    "{} is not allowed in WHEN {}",
                    node.action.name(),
                    node.kind.as_str()
                ),
            );
        }
        walk_merge_match(self, node)
    }

    fn visit_with(&mut self, node: &Arc<WithNode>) -> Node {
        if !node.recursive {
            for cte in &node.ctes {
                if let Node::Cte(cte) = cte {
                    if cte.self_reference {
                        self.error(
                            "WithNode",
                            "Recursive",
                            format!("'{}' refers to itself and requires RECURSIVE", cte.name.name),
                        );
                    }
                }
            }
        }
        walk_with(self, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{IdentifierNode, KeywordNode, NumberNode, ObjectIdentifierNode};
    use crate::dialect::Dialect;
    use crate::lexer::Location;
    use crate::parser::parse;
    use rust_decimal::Decimal;

    fn check(dialect: Dialect, sql: &str) -> ValidationResult {
        validate(&Node::StatementList(parse(dialect, sql).unwrap()))
    }

    fn at() -> Location {
        Location::new(1, 1, 0)
    }

    #[test]
    fn test_alias_requires_source_and_alias() {
        let alias = AliasNode {
            source: None,
            alias: None,
            columns: Vec::new(),
            location: at(),
        };
        let result = Node::from(alias).validate();
        assert!(!result.passed);
        assert_eq!(
            result.errors,
            vec![
                "AliasNode.Source: source is required".to_string(),
                "AliasNode.Alias: alias is required".to_string(),
            ]
        );

        let source = ObjectIdentifierNode::simple(IdentifierNode::new("t", at()));
        let complete = AliasNode::new(source.into(), IdentifierNode::new("x", at()), at());
        assert!(Node::from(complete).validate().passed);
    }

    #[test]
    fn test_between_bound_kinds() {
        let between = |high: Node| {
            Node::from(BetweenNode {
                expr: ObjectIdentifierNode::simple(IdentifierNode::new("a", at())).into(),
                not: false,
                low: NumberNode::new(Decimal::ONE, at()).into(),
                high,
                location: at(),
            })
        };
        let mixed = between(KeywordNode::new("MAX", at()).into()).validate();
        assert_eq!(
            mixed.errors,
            vec!["BetweenNode.High: bounds must be of the same kind, got NumberNode and KeywordNode"]
        );
        assert!(between(NumberNode::new(Decimal::TEN, at()).into()).validate().passed);
        assert!(check(Dialect::TSql, "SELECT a FROM t WHERE a BETWEEN b AND 10").passed);
    }

    #[test]
    fn test_parsed_queries_pass() {
        assert!(check(
            Dialect::TSql,
            "SELECT TOP 5 a AS x FROM t INNER JOIN u ON t.id = u.id CROSS JOIN v; \
             DECLARE @d DECIMAL(10, 2) = CAST('1' AS VARCHAR(10));"
        )
        .passed);
        assert!(check(
            Dialect::Postgres,
            "WITH RECURSIVE r AS (SELECT 1 UNION ALL SELECT n FROM r) SELECT * FROM r LIMIT 3 OFFSET 1"
        )
        .passed);
    }

    #[test]
    fn test_data_type_arguments() {
        let result = check(Dialect::TSql, "SELECT CAST(a AS VARCHAR(0)), CAST(b AS DECIMAL(2, 5))");
        assert_eq!(
            result.errors,
            vec![
                "DataTypeNode.Arguments: VARCHAR length must be positive, got 0",
                "DataTypeNode.Arguments: scale 5 exceeds precision 2",
            ]
        );
    }

    #[test]
    fn test_merge_action_must_match_clause() {
        let result = check(
            Dialect::TSql,
            "MERGE t USING s ON t.id = s.id WHEN NOT MATCHED THEN DELETE \
             WHEN MATCHED THEN INSERT (id) VALUES (1);",
        );
        assert_eq!(
            result.errors,
            vec![
                "MergeMatchNode.Action: DELETE is not allowed in WHEN NOT MATCHED",
                "MergeMatchNode.Action: INSERT is not allowed in WHEN MATCHED",
            ]
        );
    }

    #[test]
    fn test_self_referencing_cte_requires_recursive() {
        let result = check(
            Dialect::Postgres,
            "WITH r AS (SELECT 1 UNION ALL SELECT n FROM r) SELECT * FROM r",
        );
        assert_eq!(
            result.errors,
            vec!["WithNode.Recursive: 'r' refers to itself and requires RECURSIVE"]
        );
    }

    #[test]
    fn test_into_result() {
        let ok = ValidationResult {
            passed: true,
            errors: Vec::new(),
        };
        assert!(ok.into_result().is_ok());
        let failed = ValidationResult {
            passed: false,
            errors: vec!["A.B: one".into(), "C.D: two".into()],
        };
        let err = failed.into_result().unwrap_err();
        assert_eq!(err.to_string(), "validation failed: A.B: one; C.D: two");
    }
}
