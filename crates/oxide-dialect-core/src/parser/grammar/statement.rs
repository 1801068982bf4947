//! Statements, blocks and error recovery.

use std::sync::Arc;

use tracing::debug;

use super::expression::ExpressionRules;
use super::query::QueryRules;
use super::{operator, semicolons};
use crate::ast::{
    CteNode, DeclareNode, DeleteNode, ErrorNode, ExecuteNode, IdentifierNode, IfNode, InfixNode,
    InsertNode, ListNode, MergeAction, MergeMatchKind, MergeMatchNode, MergeNode, Node,
    OperatorNode, ParenthesisNode, SelectNode, SetNode, StatementListNode, UpdateNode,
    VariableNode, WithNode,
};
use crate::dialect::Dialect;
use crate::lexer::{Keyword, TokenKind};
use crate::parser::combinator::{
    first, list, list_separated_by, optional, parenthesized, rule, symbol, token, Parser,
};
use crate::visit::{walk_select, Visitor};

pub(super) struct StatementRules {
    pub statement: Parser<Node>,
    pub statement_or_error: Parser<Node>,
}

/// `(col, ...)`.
fn column_list(exprs: &ExpressionRules) -> Parser<Vec<Arc<IdentifierNode>>> {
    parenthesized(list_separated_by(exprs.identifier.clone(), symbol(","), 1)).map(|(_, cols)| cols)
}

/// `=` or, where the dialect has them, `+=`, `-=` and the other compound
/// assignments.
fn assignment_operator(dialect: Dialect) -> Parser<Arc<OperatorNode>> {
    if dialect.supports_compound_assignment() {
        operator(
            "assignment operator",
            &["=", "+=", "-=", "*=", "/=", "%=", "&=", "^=", "|="],
        )
    } else {
        operator("'='", &["="])
    }
}

/// `column = value, ...` as a list of infix nodes.
fn assignments(dialect: Dialect, exprs: &ExpressionRules) -> Parser<Node> {
    let target = first(vec![
        exprs.variable.clone(),
        exprs.object_identifier.clone().map(Node::from),
    ]);
    let op = assignment_operator(dialect);
    let value = exprs.expression.clone();
    let assignment = rule(move |c| {
        let left = target.parse(c)?;
        let operator = op.parse(c)?;
        let right = value.parse(c)?;
        let location = left.location();
        Some(Node::from(InfixNode {
            left,
            operator,
            right,
            location,
        }))
    });
    let items = list_separated_by(assignment, symbol(","), 1);
    rule(move |c| {
        let location = c.location();
        Some(Node::from(ListNode::new(items.parse(c)?, location)))
    })
}

/// Looks for `name` among the tables a query reads from.
struct TableReference<'a> {
    name: &'a str,
    found: bool,
}

impl TableReference<'_> {
    fn check_source(&mut self, source: &Node) {
        match source {
            Node::ObjectIdentifier(table) => {
                if table.is_simple() && table.name_str() == self.name {
                    self.found = true;
                }
            }
            Node::Alias(alias) => {
                if let Some(source) = &alias.source {
                    self.check_source(source);
                }
            }
            Node::Join(join) => {
                self.check_source(&join.left);
                self.check_source(&join.right);
            }
            Node::Parenthesis(inner) => self.check_source(&inner.inner),
            _ => {}
        }
    }
}

impl Visitor for TableReference<'_> {
    fn visit_select(&mut self, node: &Arc<SelectNode>) -> Node {
        if let Some(from) = &node.from {
            self.check_source(from);
        }
        walk_select(self, node)
    }
}

fn references_table(query: &Node, name: &str) -> bool {
    let mut finder = TableReference { name, found: false };
    query.accept(&mut finder);
    finder.found
}

fn with_statement(dialect: Dialect, exprs: &ExpressionRules, queries: &QueryRules, body: Parser<Node>) -> Parser<Node> {
    let name = exprs.identifier.clone();
    let columns = optional(column_list(exprs));
    let query = parenthesized(queries.query.clone());
    let cte = rule(move |c| {
        let name = name.parse(c)?;
        let columns = columns.parse(c)?.unwrap_or_default();
        c.keyword(Keyword::As)?;
        let (location, inner) = query.parse(c)?;
        let query = Node::from(ParenthesisNode::new(inner, location));
        let self_reference =
            dialect.supports_recursive_cte() && references_table(&query, &name.name);
        let location = name.location;
        Some(Node::from(CteNode {
            name,
            columns,
            query,
            self_reference,
            location,
        }))
    });
    let ctes = list_separated_by(cte, symbol(","), 1);
    rule(move |c| {
        let t = c.keyword(Keyword::With)?;
        let recursive =
            dialect.supports_recursive_cte() && c.keyword(Keyword::Recursive).is_some();
        let ctes = ctes.parse(c)?;
        let statement = body.parse(c)?;
        Some(Node::from(WithNode {
            recursive,
            ctes,
            statement,
            location: t.location,
        }))
    })
}

fn insert_statement(exprs: &ExpressionRules, queries: &QueryRules) -> Parser<Node> {
    let target = first(vec![
        exprs.variable.clone(),
        exprs.object_identifier.clone().map(Node::from),
    ]);
    let columns = optional(column_list(exprs));
    let source = first(vec![queries.values.clone(), queries.query.clone()]);
    rule(move |c| {
        let t = c.keyword(Keyword::Insert)?;
        c.keyword(Keyword::Into);
        let target = target.parse(c)?;
        let columns = columns.parse(c)?.unwrap_or_default();
        let source = source.parse(c)?;
        Some(Node::from(InsertNode {
            target,
            columns,
            source,
            location: t.location,
        }))
    })
}

fn update_statement(dialect: Dialect, exprs: &ExpressionRules, queries: &QueryRules) -> Parser<Node> {
    let target = queries.table_primary.clone();
    let assignments = assignments(dialect, exprs);
    let from = queries.table_source.clone();
    let condition = exprs.expression.clone();
    rule(move |c| {
        let t = c.keyword(Keyword::Update)?;
        let target = target.parse(c)?;
        c.keyword(Keyword::Set)?;
        let assignments = assignments.parse(c)?;
        let from = if c.keyword(Keyword::From).is_some() {
            Some(from.parse(c)?)
        } else {
            None
        };
        let where_clause = if c.keyword(Keyword::Where).is_some() {
            Some(condition.parse(c)?)
        } else {
            None
        };
        Some(Node::from(UpdateNode {
            target,
            assignments,
            from,
            where_clause,
            location: t.location,
        }))
    })
}

fn delete_statement(dialect: Dialect, exprs: &ExpressionRules, queries: &QueryRules) -> Parser<Node> {
    let target = queries.table_primary.clone();
    let from = queries.table_source.clone();
    let condition = exprs.expression.clone();
    let sources = match dialect {
        Dialect::TSql => Keyword::From,
        Dialect::Postgres => Keyword::Using,
    };
    rule(move |c| {
        let t = c.keyword(Keyword::Delete)?;
        c.keyword(Keyword::From);
        let target = target.parse(c)?;
        let from = if c.keyword(sources).is_some() {
            Some(from.parse(c)?)
        } else {
            None
        };
        let where_clause = if c.keyword(Keyword::Where).is_some() {
            Some(condition.parse(c)?)
        } else {
            None
        };
        Some(Node::from(DeleteNode {
            target,
            from,
            where_clause,
            location: t.location,
        }))
    })
}

fn merge_statement(dialect: Dialect, exprs: &ExpressionRules, queries: &QueryRules) -> Parser<Node> {
    let kind = rule(move |c| {
        if c.keyword(Keyword::Matched).is_some() {
            return Some(MergeMatchKind::Matched);
        }
        c.keywords(&[Keyword::Not, Keyword::Matched])?;
        if dialect.supports_merge_by_source() && c.keywords(&[Keyword::By, Keyword::Source]).is_some() {
            return Some(MergeMatchKind::NotMatchedBySource);
        }
        c.keywords(&[Keyword::By, Keyword::Target]);
        Some(MergeMatchKind::NotMatchedByTarget)
    });
    // Any action is accepted after any clause kind; the validator reports
    // combinations the clause kind does not allow.
    let action = {
        let assignments = assignments(dialect, exprs);
        let columns = optional(column_list(exprs));
        let row = queries.value_row.clone();
        rule(move |c| {
            if c.keyword(Keyword::Update).is_some() {
                c.keyword(Keyword::Set)?;
                return Some(MergeAction::Update(assignments.parse(c)?));
            }
            if c.keyword(Keyword::Delete).is_some() {
                return Some(MergeAction::Delete);
            }
            c.keyword(Keyword::Insert)?;
            let columns = columns.parse(c)?.unwrap_or_default();
            c.keyword(Keyword::Values)?;
            let values = row.parse(c)?;
            Some(MergeAction::Insert { columns, values })
        })
    };
    let clause = {
        let condition = exprs.expression.clone();
        rule(move |c| {
            let t = c.keyword(Keyword::When)?;
            let kind = kind.parse(c)?;
            let condition = if c.keyword(Keyword::And).is_some() {
                Some(condition.parse(c)?)
            } else {
                None
            };
            c.keyword(Keyword::Then)?;
            let action = action.parse(c)?;
            Some(Node::from(MergeMatchNode {
                kind,
                condition,
                action,
                location: t.location,
            }))
        })
    };
    let clauses = list(clause);
    let target = queries.table_primary.clone();
    let source = queries.table_primary.clone();
    let condition = exprs.expression.clone();
    rule(move |c| {
        let t = c.keyword(Keyword::Merge)?;
        c.keyword(Keyword::Into);
        let target = target.parse(c)?;
        c.keyword(Keyword::Using)?;
        let source = source.parse(c)?;
        c.keyword(Keyword::On)?;
        let condition = condition.parse(c)?;
        let clauses = clauses.parse(c)?;
        if clauses.is_empty() {
            return None;
        }
        Some(Node::from(MergeNode {
            target,
            source,
            condition,
            clauses,
            location: t.location,
        }))
    })
}

fn declare_statement(exprs: &ExpressionRules) -> Parser<Node> {
    let variable = token("variable", |t| t.kind == TokenKind::Variable)
        .map(|t| Arc::new(VariableNode::new(t.value, t.location)));
    let data_type = exprs.data_type.clone();
    let value = exprs.expression.clone();
    rule(move |c| {
        let t = c.keyword(Keyword::Declare)?;
        let variable = variable.parse(c)?;
        c.keyword(Keyword::As);
        let data_type = data_type.parse(c)?;
        let value = if c.symbol("=").is_some() {
            Some(value.parse(c)?)
        } else {
            None
        };
        Some(Node::from(DeclareNode {
            variable,
            data_type,
            value,
            location: t.location,
        }))
    })
}

fn set_statement(dialect: Dialect, exprs: &ExpressionRules) -> Parser<Node> {
    let target = first(vec![
        exprs.variable.clone(),
        exprs.object_identifier.clone().map(Node::from),
    ]);
    let assign = assignment_operator(dialect);
    // PostgreSQL's `TO` is held as `=`.
    let to = rule(|c| {
        let t = c.keyword(Keyword::To)?;
        Some(Arc::new(OperatorNode::new("=", t.location)))
    });
    let op = if dialect.has_keyword(Keyword::To) {
        first(vec![assign, to])
    } else {
        assign
    };
    let value = exprs.expression.clone();
    rule(move |c| {
        let t = c.keyword(Keyword::Set)?;
        let target = target.parse(c)?;
        let operator = op.parse(c)?;
        let value = value.parse(c)?;
        Some(Node::from(SetNode {
            target,
            operator,
            value,
            location: t.location,
        }))
    })
}

fn execute_statement(exprs: &ExpressionRules) -> Parser<Node> {
    let procedure = exprs.object_identifier.clone().map(Node::from);
    // A named argument `@p = value` parses as an `=` comparison.
    let arguments = list_separated_by(exprs.expression.clone(), symbol(","), 0);
    rule(move |c| {
        let t = c
            .keyword(Keyword::Exec)
            .or_else(|| c.keyword(Keyword::Execute))?;
        let procedure = procedure.parse(c)?;
        let arguments = arguments.parse(c)?;
        Some(Node::from(ExecuteNode {
            procedure,
            arguments,
            location: t.location,
        }))
    })
}

fn if_statement(exprs: &ExpressionRules, statement_ref: &Parser<Node>) -> Parser<Node> {
    let condition = exprs.expression.clone();
    let branch = statement_ref.clone();
    rule(move |c| {
        let t = c.keyword(Keyword::If)?;
        let condition = condition.parse(c)?;
        let then_branch = branch.parse(c)?;
        let else_branch = if c.keyword(Keyword::Else).is_some() {
            Some(branch.parse(c)?)
        } else {
            None
        };
        Some(Node::from(IfNode {
            condition,
            then_branch,
            else_branch,
            location: t.location,
        }))
    })
}

fn block(body: Parser<Node>) -> Parser<Node> {
    let statements = list(body);
    rule(move |c| {
        let t = c.keyword(Keyword::Begin)?;
        let statements = statements.parse(c)?;
        c.keyword(Keyword::End)?;
        Some(Node::from(StatementListNode {
            statements,
            begin_end: true,
            location: t.location,
        }))
    })
}

/// Wraps `statement` so that a statement which does not parse becomes an
/// [`ErrorNode`] instead of failing the whole input.
///
/// The tokens of the broken statement are skipped up to and including the
/// next `;`. Skipping stops before `END` so an enclosing block can close.
fn recovering(statement: Parser<Node>) -> Parser<Node> {
    rule(move |c| {
        c.clear_expectations();
        if let Some(node) = statement.parse(c) {
            return Some(node);
        }
        if c.is_eof() || c.peek_keyword(Keyword::End) {
            return None;
        }
        let message = c.error_message();
        let location = c.error_location();
        while !c.is_eof() && !c.peek_keyword(Keyword::End) {
            if c.advance().is_symbol(";") {
                break;
            }
        }
        while c.peek_symbol(";") {
            c.advance();
        }
        c.clear_expectations();
        debug!(
            line = location.line,
            column = location.column,
            %message,
            "skipped unparsable statement"
        );
        Some(Node::from(ErrorNode { message, location }))
    })
}

pub(super) fn rules(
    dialect: Dialect,
    exprs: &ExpressionRules,
    queries: &QueryRules,
    statement_ref: &Parser<Node>,
) -> StatementRules {
    let insert = insert_statement(exprs, queries);
    let update = update_statement(dialect, exprs, queries);
    let delete = delete_statement(dialect, exprs, queries);
    let merge = merge_statement(dialect, exprs, queries);
    let with_body = first(vec![
        queries.query.clone(),
        insert.clone(),
        update.clone(),
        delete.clone(),
        merge.clone(),
    ]);
    let statement_or_error = recovering(statement_ref.clone());

    let body = first(vec![
        with_statement(dialect, exprs, queries, with_body),
        queries.query.clone(),
        insert,
        update,
        delete,
        merge,
        declare_statement(exprs),
        set_statement(dialect, exprs),
        execute_statement(exprs),
        if_statement(exprs, statement_ref),
        block(statement_or_error.clone()),
    ]);
    let statement = body.then(semicolons()).map(|(node, ())| node);

    StatementRules {
        statement,
        statement_or_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::cursor::Cursor;
    use crate::parser::grammar::grammar;

    fn statement_in(sql: &str, dialect: Dialect) -> Node {
        let mut c = Cursor::new(tokenize(sql, dialect).unwrap(), dialect, 128);
        let node = grammar(dialect).statement().parse(&mut c).unwrap();
        assert!(c.is_eof(), "trailing input after {sql}: {}", c.error_message());
        node
    }

    fn statement(sql: &str) -> Node {
        statement_in(sql, Dialect::TSql)
    }

    #[test]
    fn test_insert_forms() {
        let Node::Insert(insert) = statement("INSERT INTO t (a, b) VALUES (1, 2), (3, DEFAULT);") else {
            panic!("expected insert");
        };
        assert_eq!(insert.columns.len(), 2);
        assert!(matches!(&insert.source, Node::Values(v) if v.rows.len() == 2));
        let Node::Insert(insert) = statement("INSERT t SELECT a FROM u") else {
            panic!("expected insert");
        };
        assert!(matches!(insert.source, Node::Select(_)));
    }

    #[test]
    fn test_update_with_compound_assignment() {
        let Node::Update(update) = statement("UPDATE t SET a = 1, b += 2 FROM t JOIN u ON t.id = u.id WHERE u.x = 1") else {
            panic!("expected update");
        };
        assert!(matches!(&update.assignments, Node::List(l) if l.items.len() == 2));
        assert!(update.from.is_some());
        assert!(update.where_clause.is_some());
    }

    #[test]
    fn test_delete_sources_per_dialect() {
        let Node::Delete(delete) = statement("DELETE FROM t FROM t JOIN u ON t.id = u.id") else {
            panic!("expected delete");
        };
        assert!(delete.from.is_some());
        let Node::Delete(delete) = statement_in("DELETE FROM t USING u WHERE t.id = u.id", Dialect::Postgres) else {
            panic!("expected delete");
        };
        assert!(delete.from.is_some());
    }

    #[test]
    fn test_merge_clauses() {
        let sql = "MERGE INTO t AS tgt USING s ON tgt.id = s.id \
                   WHEN MATCHED AND s.gone = 1 THEN DELETE \
                   WHEN MATCHED THEN UPDATE SET v = s.v \
                   WHEN NOT MATCHED BY TARGET THEN INSERT (id, v) VALUES (s.id, s.v) \
                   WHEN NOT MATCHED BY SOURCE THEN DELETE;";
        let Node::Merge(merge) = statement(sql) else {
            panic!("expected merge");
        };
        let kinds: Vec<_> = merge
            .clauses
            .iter()
            .map(|c| match c {
                Node::MergeMatch(m) => m.kind,
                other => panic!("expected clause, got {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                MergeMatchKind::Matched,
                MergeMatchKind::Matched,
                MergeMatchKind::NotMatchedByTarget,
                MergeMatchKind::NotMatchedBySource,
            ]
        );
    }

    #[test]
    fn test_declare_set_exec() {
        let Node::Declare(declare) = statement("DECLARE @n INT = 5") else {
            panic!("expected declare");
        };
        assert_eq!(declare.variable.name, "@n");
        assert!(declare.value.is_some());
        assert!(matches!(statement("SET @n += 1"), Node::Set(s) if s.operator.operator == "+="));
        let Node::Execute(exec) = statement("EXEC dbo.proc @a = 1, 2") else {
            panic!("expected exec");
        };
        assert_eq!(exec.arguments.len(), 2);
    }

    #[test]
    fn test_postgres_set_to() {
        let Node::Set(set) = statement_in("SET search_path TO public", Dialect::Postgres) else {
            panic!("expected set");
        };
        assert_eq!(set.operator.operator, "=");
    }

    #[test]
    fn test_if_else_block() {
        let Node::If(branch) = statement("IF @x > 1 BEGIN SELECT 1; SELECT 2; END ELSE SELECT 3;") else {
            panic!("expected if");
        };
        assert!(matches!(&branch.then_branch, Node::StatementList(b) if b.begin_end && b.statements.len() == 2));
        assert!(branch.else_branch.is_some());
    }

    #[test]
    fn test_recursive_cte_marks_self_reference() {
        let sql = "WITH RECURSIVE r (n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM r WHERE n < 5) SELECT n FROM r";
        let Node::With(with) = statement_in(sql, Dialect::Postgres) else {
            panic!("expected with");
        };
        assert!(with.recursive);
        assert!(matches!(&with.ctes[0], Node::Cte(cte) if cte.self_reference));
    }

    #[test]
    fn test_block_recovers_from_broken_statement() {
        let Node::StatementList(block) = statement("BEGIN SELECT FROM; SELECT 1; END") else {
            panic!("expected block");
        };
        assert_eq!(block.statements.len(), 2);
        assert!(matches!(&block.statements[0], Node::Error(_)));
        assert!(matches!(&block.statements[1], Node::Select(_)));
    }
}
