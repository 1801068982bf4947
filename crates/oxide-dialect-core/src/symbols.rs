//! Symbol tables.
//!
//! [`build_symbol_tables`] walks a tree and opens one scope per
//! symbol-scope node (statement lists, SELECT, INSERT, UPDATE, DELETE, MERGE
//! and WITH). Table sources, CTE names and select-list aliases are defined in
//! the scope of the statement that introduces them; variables are defined in
//! the root scope, as a batch shares its variables. Lookups go outwards
//! through the enclosing scopes, so a correlated subquery sees the tables of
//! the query around it.
//!
//! The build stops at the first error:
//!
//! - a name defined twice in one scope is [`SymbolError::AlreadyDefined`];
//! - a table qualifier (`x` in `x.col` or `x.*`) or a variable that is not
//!   visible is [`SymbolError::NotDefined`].
//!
//! Unqualified column names are not checked, as they refer to the catalog.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use tracing::debug;

use crate::ast::{
    DeclareNode, DeleteNode, ExecuteNode, FunctionCallNode, InsertNode, MergeNode, Node,
    ObjectIdentifierNode, SelectNode, StarNode, StatementListNode, UpdateNode, VariableNode,
    WithNode,
};
use crate::lexer::Location;
use crate::visit::Visitor;

/// What a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolType {
    /// A select-list alias.
    Column,
    /// A table, view, derived table, table function or CTE.
    TableExpression,
    /// A declared variable.
    Variable,
}

/// A defined name.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    /// What the name refers to.
    pub data_type: SymbolType,
    /// The node that defines it.
    pub origin: Node,
}

/// Symbol table errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SymbolError {
    /// A name was defined twice in one scope.
    #[error("'{name}' is already defined")]
    AlreadyDefined {
        /// The name.
        name: String,
        /// Where the second definition starts.
        location: Location,
    },

    /// A name was used where no definition is visible.
    #[error("'{name}' is not defined")]
    NotDefined {
        /// The name.
        name: String,
        /// Where the name was used, if known.
        location: Option<Location>,
    },
}

/// The names defined in one scope. Lookups ignore case.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolInfo>,
}

impl SymbolTable {
    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Defines `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::AlreadyDefined`] if the scope already has it.
    pub fn define(&mut self, name: &str, info: SymbolInfo) -> Result<(), SymbolError> {
        let key = Self::key(name);
        if self.symbols.contains_key(&key) {
            return Err(SymbolError::AlreadyDefined {
                name: name.to_string(),
                location: info.origin.location(),
            });
        }
        self.symbols.insert(key, info);
        Ok(())
    }

    /// Looks up `name` in this scope only.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.get(&Self::key(name))
    }

    /// Looks up `name` in this scope only.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::NotDefined`] if the scope does not have it.
    pub fn get_info_or_throw(&self, name: &str) -> Result<&SymbolInfo, SymbolError> {
        self.get(name).ok_or_else(|| SymbolError::NotDefined {
            name: name.to_string(),
            location: None,
        })
    }

    /// The number of names defined in this scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if the scope defines nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Index of a scope in a [`ScopeTree`].
pub type ScopeId = usize;

#[derive(Debug, Clone)]
struct Scope {
    node: Node,
    parent: Option<ScopeId>,
    table: SymbolTable,
}

/// The scopes of a tree, each tied to the node that opened it.
///
/// The tree itself is not modified; the tables are looked up by node
/// identity.
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// The number of scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns true if no scope was opened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// The outermost scope, which holds the variables.
    #[must_use]
    pub fn root(&self) -> Option<&SymbolTable> {
        self.scopes.first().map(|s| &s.table)
    }

    /// The scope opened by `node`.
    #[must_use]
    pub fn scope_for(&self, node: &Node) -> Option<ScopeId> {
        self.scopes.iter().position(|s| s.node.ptr_eq(node))
    }

    /// The table of the scope opened by `node`.
    #[must_use]
    pub fn table_for(&self, node: &Node) -> Option<&SymbolTable> {
        self.scope_for(node).and_then(|id| self.table(id))
    }

    /// The table of scope `id`.
    #[must_use]
    pub fn table(&self, id: ScopeId) -> Option<&SymbolTable> {
        self.scopes.get(id).map(|s| &s.table)
    }

    /// The scope enclosing scope `id`.
    #[must_use]
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes.get(id).and_then(|s| s.parent)
    }

    /// Looks up `name` in scope `id` and then outwards.
    #[must_use]
    pub fn resolve(&self, id: ScopeId, name: &str) -> Option<&SymbolInfo> {
        let mut next = Some(id);
        while let Some(id) = next {
            let scope = self.scopes.get(id)?;
            if let Some(info) = scope.table.get(name) {
                return Some(info);
            }
            next = scope.parent;
        }
        None
    }

    /// Like [`resolve`](Self::resolve), failing when the name is not visible.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::NotDefined`] if no enclosing scope defines it.
    pub fn get_info_or_throw(&self, id: ScopeId, name: &str) -> Result<&SymbolInfo, SymbolError> {
        self.resolve(id, name).ok_or_else(|| SymbolError::NotDefined {
            name: name.to_string(),
            location: None,
        })
    }
}

/// Builds the scopes of `root`.
///
/// # Errors
///
/// Returns the first duplicate definition or use of an undefined name.
pub fn build_symbol_tables(root: &Node) -> Result<ScopeTree, SymbolError> {
    let mut builder = Builder::default();
    if !root.is_symbol_scope() {
        builder.enter(root);
    }
    root.accept(&mut builder);
    if let Some(error) = builder.error {
        debug!(%error, "symbol table build failed");
        return Err(error);
    }
    debug!(scopes = builder.tree.len(), "symbol tables built");
    Ok(builder.tree)
}

#[derive(Default)]
struct Builder {
    tree: ScopeTree,
    current: Option<ScopeId>,
    error: Option<SymbolError>,
}

impl Builder {
    const fn failed(&self) -> bool {
        self.error.is_some()
    }

    fn fail(&mut self, error: SymbolError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Opens a scope for `node`, returning the scope to restore afterwards.
    fn enter(&mut self, node: &Node) -> Option<ScopeId> {
        let id = self.tree.scopes.len();
        self.tree.scopes.push(Scope {
            node: node.clone(),
            parent: self.current,
            table: SymbolTable::default(),
        });
        mem::replace(&mut self.current, Some(id))
    }

    fn leave(&mut self, previous: Option<ScopeId>) {
        self.current = previous;
    }

    fn define_in(&mut self, scope: Option<ScopeId>, name: &str, data_type: SymbolType, origin: &Node) {
        let Some(scope) = scope.and_then(|id| self.tree.scopes.get_mut(id)) else {
            return;
        };
        let info = SymbolInfo {
            data_type,
            origin: origin.clone(),
        };
        if let Err(error) = scope.table.define(name, info) {
            self.fail(error);
        }
    }

    fn define(&mut self, name: &str, data_type: SymbolType, origin: &Node) {
        self.define_in(self.current, name, data_type, origin);
    }

    fn defined_locally(&self, name: &str) -> bool {
        self.current
            .and_then(|id| self.tree.table(id))
            .is_some_and(|table| table.get(name).is_some())
    }

    fn require(&mut self, name: &str, location: Location) {
        let visible = self
            .current
            .is_some_and(|id| self.tree.resolve(id, name).is_some());
        if !visible {
            self.fail(SymbolError::NotDefined {
                name: name.to_string(),
                location: Some(location),
            });
        }
    }

    /// Defines the names a FROM clause (or a DML target) introduces.
    fn define_sources(&mut self, source: &Node) {
        match source {
            Node::ObjectIdentifier(table) => {
                self.define(table.name_str(), SymbolType::TableExpression, source);
            }
            Node::Alias(alias) => {
                if let Some(name) = &alias.alias {
                    self.define(&name.name, SymbolType::TableExpression, source);
                } else if let Some(inner) = &alias.source {
                    self.define_sources(inner);
                }
            }
            Node::Join(join) => {
                self.define_sources(&join.left);
                self.define_sources(&join.right);
            }
            Node::Parenthesis(paren) if !paren.inner.is_query() => {
                self.define_sources(&paren.inner);
            }
            _ => {}
        }
    }

    /// Visits the expressions inside a FROM clause. Table names are
    /// definitions, not references, so they are skipped.
    fn walk_sources(&mut self, source: &Node) {
        match source {
            Node::ObjectIdentifier(_) => {}
            Node::Alias(alias) => {
                if let Some(inner) = &alias.source {
                    self.walk_sources(inner);
                }
            }
            Node::Join(join) => {
                self.walk_sources(&join.left);
                self.walk_sources(&join.right);
                if let Some(condition) = &join.condition {
                    condition.accept(self);
                }
            }
            Node::Parenthesis(paren) if !paren.inner.is_query() => {
                self.walk_sources(&paren.inner);
            }
            Node::FunctionCall(call) => {
                for argument in &call.arguments {
                    argument.accept(self);
                }
            }
            other => {
                other.accept(self);
            }
        }
    }

    /// Defines a DML target unless a FROM clause already named it.
    fn define_target(&mut self, target: &Node) {
        let name = match target {
            Node::ObjectIdentifier(table) if table.is_simple() => Some(table.name_str()),
            Node::Alias(alias) => alias.alias_str(),
            _ => None,
        };
        if !name.is_some_and(|name| self.defined_locally(name)) {
            self.define_sources(target);
        }
    }

    fn accept_all<'a>(&mut self, nodes: impl IntoIterator<Item = &'a Node>) {
        for node in nodes {
            if self.failed() {
                return;
            }
            node.accept(self);
        }
    }
}

impl Visitor for Builder {
    fn visit_statement_list(&mut self, node: &Arc<StatementListNode>) -> Node {
        let this = Node::StatementList(Arc::clone(node));
        let previous = self.enter(&this);
        self.accept_all(&node.statements);
        self.leave(previous);
        this
    }

    fn visit_select(&mut self, node: &Arc<SelectNode>) -> Node {
        let this = Node::Select(Arc::clone(node));
        let previous = self.enter(&this);
        if let Some(from) = &node.from {
            self.define_sources(from);
            self.walk_sources(from);
        }
        self.accept_all(&node.top);
        match &node.columns {
            Node::List(columns) => {
                for item in &columns.items {
                    item.accept(self);
                    if let Node::Alias(alias) = item {
                        if let Some(name) = &alias.alias {
                            self.define(&name.name, SymbolType::Column, item);
                        }
                    }
                }
            }
            other => {
                other.accept(self);
            }
        }
        self.accept_all(
            [
                &node.where_clause,
                &node.group_by,
                &node.having,
                &node.order_by,
                &node.limit,
                &node.offset,
                &node.fetch,
            ]
            .into_iter()
            .flatten(),
        );
        self.leave(previous);
        this
    }

    fn visit_with(&mut self, node: &Arc<WithNode>) -> Node {
        let this = Node::With(Arc::clone(node));
        let previous = self.enter(&this);
        for cte in &node.ctes {
            if let Node::Cte(definition) = cte {
                // Defined first so a recursive CTE can refer to itself.
                self.define(&definition.name.name, SymbolType::TableExpression, cte);
                self.accept_all([&definition.query]);
            }
        }
        self.accept_all([&node.statement]);
        self.leave(previous);
        this
    }

    fn visit_insert(&mut self, node: &Arc<InsertNode>) -> Node {
        let this = Node::Insert(Arc::clone(node));
        let previous = self.enter(&this);
        match &node.target {
            Node::Variable(variable) => {
                self.visit_variable(variable);
            }
            target => self.define_sources(target),
        }
        self.accept_all([&node.source]);
        self.leave(previous);
        this
    }

    fn visit_update(&mut self, node: &Arc<UpdateNode>) -> Node {
        let this = Node::Update(Arc::clone(node));
        let previous = self.enter(&this);
        if let Some(from) = &node.from {
            self.define_sources(from);
            self.walk_sources(from);
        }
        self.define_target(&node.target);
        self.walk_sources(&node.target);
        self.accept_all([&node.assignments]);
        self.accept_all(&node.where_clause);
        self.leave(previous);
        this
    }

    fn visit_delete(&mut self, node: &Arc<DeleteNode>) -> Node {
        let this = Node::Delete(Arc::clone(node));
        let previous = self.enter(&this);
        if let Some(from) = &node.from {
            self.define_sources(from);
            self.walk_sources(from);
        }
        self.define_target(&node.target);
        self.walk_sources(&node.target);
        self.accept_all(&node.where_clause);
        self.leave(previous);
        this
    }

    fn visit_merge(&mut self, node: &Arc<MergeNode>) -> Node {
        let this = Node::Merge(Arc::clone(node));
        let previous = self.enter(&this);
        self.define_sources(&node.target);
        self.define_sources(&node.source);
        self.walk_sources(&node.target);
        self.walk_sources(&node.source);
        self.accept_all([&node.condition]);
        self.accept_all(&node.clauses);
        self.leave(previous);
        this
    }

    fn visit_declare(&mut self, node: &Arc<DeclareNode>) -> Node {
        let this = Node::Declare(Arc::clone(node));
        self.accept_all(&node.value);
        let root = if self.tree.is_empty() { None } else { Some(0) };
        self.define_in(root, &node.variable.name, SymbolType::Variable, &this);
        this
    }

    fn visit_execute(&mut self, node: &Arc<ExecuteNode>) -> Node {
        for argument in &node.arguments {
            match argument {
                // Named arguments name procedure parameters, not variables.
                Node::Infix(named)
                    if named.operator.operator == "="
                        && matches!(named.left, Node::Variable(_)) =>
                {
                    self.accept_all([&named.right]);
                }
                other => self.accept_all([other]),
            }
        }
        Node::Execute(Arc::clone(node))
    }

    fn visit_variable(&mut self, node: &Arc<VariableNode>) -> Node {
        // `@@ROWCOUNT` and friends are built in.
        if !node.name.starts_with("@@") {
            self.require(&node.name, node.location);
        }
        Node::Variable(Arc::clone(node))
    }

    fn visit_object_identifier(&mut self, node: &Arc<ObjectIdentifierNode>) -> Node {
        if let Some(qualifier) = &node.schema {
            self.require(&qualifier.name, qualifier.location);
        }
        Node::ObjectIdentifier(Arc::clone(node))
    }

    fn visit_star(&mut self, node: &Arc<StarNode>) -> Node {
        if let Some(qualifier) = &node.qualifier {
            self.require(qualifier.name_str(), qualifier.location);
        }
        Node::Star(Arc::clone(node))
    }

    fn visit_function_call(&mut self, node: &Arc<FunctionCallNode>) -> Node {
        self.accept_all(&node.arguments);
        Node::FunctionCall(Arc::clone(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::parser::parse;

    fn build(sql: &str) -> Result<ScopeTree, SymbolError> {
        build_in(sql, Dialect::TSql)
    }

    fn build_in(sql: &str, dialect: Dialect) -> Result<ScopeTree, SymbolError> {
        let tree = parse(dialect, sql).unwrap();
        build_symbol_tables(&Node::StatementList(tree))
    }

    fn not_defined(result: Result<ScopeTree, SymbolError>) -> String {
        match result {
            Err(SymbolError::NotDefined { name, .. }) => name,
            other => panic!("expected NotDefined, got {other:?}"),
        }
    }

    #[test]
    fn test_undefined_qualifier() {
        assert_eq!(not_defined(build("SELECT x.a FROM t")), "x");
        assert_eq!(not_defined(build("SELECT x.* FROM t")), "x");
    }

    #[test]
    fn test_duplicate_table_in_one_scope() {
        let err = build("SELECT * FROM t JOIN t ON t.a = t.b").unwrap_err();
        assert!(matches!(err, SymbolError::AlreadyDefined { ref name, .. } if name == "t"));
        assert_eq!(err.to_string(), "'t' is already defined");
    }

    #[test]
    fn test_variable_must_be_declared_first() {
        assert_eq!(not_defined(build("SET @a = 1; DECLARE @a INT;")), "@a");
        assert!(build("DECLARE @a INT; SET @a = 1; SELECT @a, @@ROWCOUNT;").is_ok());
    }

    #[test]
    fn test_declared_variable_lands_in_root_scope() {
        let scopes = build("DECLARE @a INT = 1; IF @a > 0 BEGIN DECLARE @b INT; END; SET @b = 2;").unwrap();
        let root = scopes.root().unwrap();
        assert_eq!(root.get_info_or_throw("@A").unwrap().data_type, SymbolType::Variable);
        assert!(root.get("@b").is_some());
    }

    #[test]
    fn test_aliases_and_correlation() {
        assert!(build("SELECT u.a FROM dbo.t AS u WHERE u.b = 1").is_ok());
        assert!(build("SELECT a FROM t WHERE EXISTS (SELECT 1 FROM u WHERE u.id = t.id)").is_ok());
        assert_eq!(not_defined(build("SELECT u.a FROM t WHERE EXISTS (SELECT 1 FROM u)")), "u");
        assert!(build("SELECT d.n FROM (SELECT 1 AS n) AS d").is_ok());
    }

    #[test]
    fn test_duplicate_select_alias() {
        assert!(matches!(
            build("SELECT 1 AS x, 2 AS x"),
            Err(SymbolError::AlreadyDefined { .. })
        ));
    }

    #[test]
    fn test_cte_and_dml_scopes() {
        assert!(build("WITH c AS (SELECT 1 AS n) SELECT c.n FROM c").is_ok());
        assert!(build("UPDATE x SET x.a = 1 FROM t AS x WHERE x.b = 2").is_ok());
        assert!(build("DELETE FROM t WHERE t.a = 1").is_ok());
        assert!(build("EXEC dbo.p @a = 1").is_ok());
        assert!(build_in("DELETE FROM t USING u WHERE t.id = u.id", Dialect::Postgres).is_ok());
        assert!(build(
            "MERGE INTO t AS tgt USING s ON tgt.id = s.id \
             WHEN MATCHED THEN UPDATE SET v = s.v \
             WHEN NOT MATCHED THEN INSERT (id) VALUES (s.id);"
        )
        .is_ok());
    }

    #[test]
    fn test_tables_are_found_by_node() {
        let tree = Node::StatementList(parse(Dialect::TSql, "SELECT a AS b FROM t").unwrap());
        let scopes = build_symbol_tables(&tree).unwrap();
        let Node::StatementList(list) = &tree else {
            unreachable!()
        };
        let select = &list.statements[0];
        let table = scopes.table_for(select).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get_info_or_throw("T").unwrap().data_type, SymbolType::TableExpression);
        assert_eq!(table.get_info_or_throw("b").unwrap().data_type, SymbolType::Column);
        assert!(matches!(
            table.get_info_or_throw("zz"),
            Err(SymbolError::NotDefined { location: None, .. })
        ));
        let id = scopes.scope_for(select).unwrap();
        assert_eq!(scopes.parent(id), Some(0));
    }
}
