//! Subcommand implementations. Each returns the text to print on success.

use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use tracing::{debug, info};

use oxide_dialect_core::{
    build_symbol_tables, fold_constants, parse_tree_with_options, parse_with_options, validate,
    Dialect, Node, ParseOptions,
};

/// Reads `path`, or standard input when no path is given.
pub fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut sql = String::new();
            std::io::stdin()
                .read_to_string(&mut sql)
                .context("failed to read standard input")?;
            Ok(sql)
        }
    }
}

fn parse(dialect: Dialect, sql: &str, options: ParseOptions) -> anyhow::Result<Node> {
    let tree = parse_with_options(dialect, sql, options)?;
    Ok(Node::StatementList(tree))
}

/// Parses every statement and lists the ones that failed.
pub fn check(dialect: Dialect, sql: &str, options: ParseOptions) -> anyhow::Result<String> {
    let tree = parse_tree_with_options(dialect, sql, options)?;
    let errors = tree.errors();
    if errors.is_empty() {
        info!(statements = tree.statements.len(), "no syntax errors");
        return Ok(format!("ok: {} statement(s)", tree.statements.len()));
    }
    let mut report = String::new();
    for error in &errors {
        let _ = writeln!(
            report,
            "{}:{}: {}",
            error.location.line, error.location.column, error.message
        );
    }
    bail!("{} syntax error(s)\n{}", errors.len(), report.trim_end());
}

/// Re-renders the input in its own dialect.
pub fn format(dialect: Dialect, sql: &str, options: ParseOptions) -> anyhow::Result<String> {
    Ok(parse(dialect, sql, options)?.to_sql(dialect))
}

/// Folds constant expressions and renders the result.
pub fn fold(dialect: Dialect, sql: &str, options: ParseOptions) -> anyhow::Result<String> {
    let folded = fold_constants(&parse(dialect, sql, options)?);
    Ok(folded.to_sql(dialect))
}

/// Renders the input in the syntax of `to`.
pub fn translate(
    from: Dialect,
    to: Dialect,
    sql: &str,
    options: ParseOptions,
) -> anyhow::Result<String> {
    debug!(%from, %to, "translating");
    Ok(parse(from, sql, options)?.to_sql(to))
}

/// Builds symbol tables and runs validation.
pub fn analyze(dialect: Dialect, sql: &str, options: ParseOptions) -> anyhow::Result<String> {
    let tree = parse(dialect, sql, options)?;
    let scopes = build_symbol_tables(&tree).context("symbol table build failed")?;
    let variables = scopes.root().map_or(0, |root| root.len());
    validate(&tree).into_result()?;
    Ok(format!(
        "ok: {} scope(s), {} variable(s), validation passed",
        scopes.len(),
        variables
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn defaults() -> ParseOptions {
        ParseOptions::default()
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "SELECT 1").unwrap();
        assert_eq!(read_input(Some(file.path())).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_read_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.sql");
        let err = read_input(Some(&missing)).unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }

    #[test]
    fn test_check_lists_errors() {
        assert_eq!(check(Dialect::TSql, "SELECT 1; SELECT 2", defaults()).unwrap(), "ok: 2 statement(s)");
        let err = check(Dialect::TSql, "SELECT 1;\nSELECT FROM;", defaults()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("1 syntax error(s)\n2:"), "{message}");
    }

    #[test]
    fn test_format_and_fold() {
        assert_eq!(format(Dialect::TSql, "select a from t", defaults()).unwrap(), "SELECT a\nFROM t;");
        assert_eq!(fold(Dialect::TSql, "select 1 + 2", defaults()).unwrap(), "SELECT 3;");
        assert!(format(Dialect::TSql, "select from", defaults()).is_err());
    }

    #[test]
    fn test_translate() {
        let sql = translate(Dialect::TSql, Dialect::Postgres, "SELECT TOP 2 [order] FROM t", defaults()).unwrap();
        assert_eq!(sql, "SELECT \"order\"\nFROM t\nLIMIT 2;");
    }

    #[test]
    fn test_analyze() {
        let report = analyze(Dialect::TSql, "DECLARE @a INT; SELECT @a", defaults()).unwrap();
        assert_eq!(report, "ok: 2 scope(s), 1 variable(s), validation passed");
        let err = analyze(Dialect::TSql, "SELECT x.a FROM t", defaults()).unwrap_err();
        assert_eq!(format!("{err:#}"), "symbol table build failed: 'x' is not defined");
    }
}
