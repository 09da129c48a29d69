//! Collects every name read anywhere inside a statement
//!
//! Function bodies, lambdas, comprehensions and nested classes are all
//! included. The result only decides which symbols get pulled into the
//! bundle; it never constrains their order.

use ruff_python_ast::{
    Expr, ExprContext, Stmt,
    visitor::{Visitor, walk_expr},
};

use crate::types::FxIndexSet;

#[derive(Debug, Default)]
pub struct NameLoadCollector {
    /// Names in `Load` context, in first-seen source order
    loads: FxIndexSet<String>,
}

impl NameLoadCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect all loaded names inside `stmt`
    pub fn collect_from_stmt(stmt: &Stmt) -> FxIndexSet<String> {
        let mut collector = Self::new();
        collector.visit_stmt(stmt);
        collector.loads
    }

    /// Collect all loaded names inside each of `exprs`
    pub fn collect_from_exprs<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> FxIndexSet<String> {
        let mut collector = Self::new();
        for expr in exprs {
            collector.visit_expr(expr);
        }
        collector.loads
    }
}

impl<'a> Visitor<'a> for NameLoadCollector {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if let Expr::Name(name) = expr
            && matches!(name.ctx, ExprContext::Load)
        {
            self.loads.insert(name.id.to_string());
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;

    use super::*;

    fn loads_of_first_stmt(source: &str) -> Vec<String> {
        let parsed = parse_module(source).expect("Failed to parse test module");
        let module = parsed.into_syntax();
        NameLoadCollector::collect_from_stmt(&module.body[0])
            .into_iter()
            .collect()
    }

    #[test]
    fn test_function_body_loads_are_collected() {
        let loads = loads_of_first_stmt(
            r#"
@cache
def solve(n: int = LIMIT) -> Result:
    table = build(n)
    total = sum(table)
    return helper(total)
"#,
        );
        for expected in [
            "cache", "int", "LIMIT", "Result", "build", "sum", "helper", "table", "total", "n",
        ] {
            assert!(loads.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(!loads.contains(&"solve".to_string()));
    }

    #[test]
    fn test_store_and_delete_contexts_are_skipped() {
        let loads = loads_of_first_stmt(
            r#"
def f():
    x = 1
    del y
    z += 1
"#,
        );
        assert!(!loads.contains(&"x".to_string()));
        assert!(!loads.contains(&"y".to_string()));
        assert!(!loads.contains(&"z".to_string()));
    }

    #[test]
    fn test_nested_scopes_are_walked() {
        let loads = loads_of_first_stmt(
            r#"
class Graph(Base):
    def edges(self):
        return [weight(e) for e in self.raw if keep(e)]

    handler = lambda v: transform(v)
"#,
        );
        for expected in ["Base", "weight", "keep", "transform", "self", "e", "v"] {
            assert!(loads.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn test_assignment_value_loads() {
        let loads = loads_of_first_stmt("TABLE = make_table(SIZE, mod=MOD)\n");
        assert_eq!(loads, vec!["make_table", "SIZE", "MOD"]);
    }
}
