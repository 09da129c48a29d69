use ruff_python_ast::{Expr, Parameters, Stmt};

use super::NameLoadCollector;
use crate::types::FxIndexSet;

/// Collects the names a top-level definition evaluates while it is being
/// defined, as opposed to when it is later called.
///
/// Evaluated at definition time:
/// - decorators (functions and classes)
/// - parameter defaults and annotations, and the return annotation
/// - base classes and header keywords such as `metaclass=`
/// - the right-hand side and annotation of (annotated) assignments
///
/// Function bodies are skipped: a name only used there may be defined later
/// in the bundle.
#[derive(Debug, Default)]
pub struct DefinitionTimeCollector<'a> {
    /// Expressions evaluated when the definition executes
    context_exprs: Vec<&'a Expr>,
}

impl<'a> DefinitionTimeCollector<'a> {
    /// Names `stmt` reads at definition time
    pub fn collect(stmt: &'a Stmt) -> FxIndexSet<String> {
        let mut collector = Self::default();
        collector.visit_definition(stmt);
        NameLoadCollector::collect_from_exprs(collector.context_exprs)
    }

    fn visit_definition(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::FunctionDef(function_def) => {
                self.context_exprs.extend(
                    function_def
                        .decorator_list
                        .iter()
                        .map(|decorator| &decorator.expression),
                );
                self.visit_parameters(&function_def.parameters);
                if let Some(returns) = &function_def.returns {
                    self.context_exprs.push(returns);
                }
            }
            Stmt::ClassDef(class_def) => {
                self.context_exprs.extend(
                    class_def
                        .decorator_list
                        .iter()
                        .map(|decorator| &decorator.expression),
                );
                self.context_exprs.extend(class_def.bases());
                self.context_exprs
                    .extend(class_def.keywords().iter().map(|keyword| &keyword.value));
            }
            Stmt::Assign(assign) => {
                self.context_exprs.push(&assign.value);
            }
            Stmt::AnnAssign(ann_assign) => {
                self.context_exprs.push(&ann_assign.annotation);
                if let Some(value) = &ann_assign.value {
                    self.context_exprs.push(value);
                }
            }
            _ => {}
        }
    }

    fn visit_parameters(&mut self, parameters: &'a Parameters) {
        for parameter in parameters
            .posonlyargs
            .iter()
            .chain(&parameters.args)
            .chain(&parameters.kwonlyargs)
        {
            if let Some(default) = &parameter.default {
                self.context_exprs.push(default);
            }
            if let Some(annotation) = &parameter.parameter.annotation {
                self.context_exprs.push(annotation);
            }
        }

        for parameter in [&parameters.vararg, &parameters.kwarg].into_iter().flatten() {
            if let Some(annotation) = &parameter.annotation {
                self.context_exprs.push(annotation);
            }
        }
    }
}
