use crate::{
    obs::sink::{self, OptimizeEvent, SkipReason},
    optimize::{QueryOptimizer, determinism::ProjectAnalyzer},
    query::{
        AndClause, ChangedClause, Clause, ClauseVisitor, NotClause, Operand, OrClause, Query,
        TerminalClause, WasClause,
    },
};
use std::sync::Arc;

///
/// FunctionRewrite
///
/// Binds the project set of a determined tree into every zero-argument call
/// to one target function, so `fixVersion in releasedVersions()` under
/// `project = ABC` becomes `fixVersion in releasedVersions(ABC)`.
///
/// The project set is computed once from the whole tree and every rewritten
/// terminal receives the same set. Calls that already carry arguments are
/// never touched.
///

#[derive(Clone, Debug)]
pub struct FunctionRewrite {
    function: String,
    analyzer: ProjectAnalyzer,
}

impl FunctionRewrite {
    #[must_use]
    pub fn new(function: impl Into<String>, analyzer: ProjectAnalyzer) -> Self {
        Self {
            function: function.into(),
            analyzer,
        }
    }

    /// Target function name, in the case it was configured.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Rewrite `clause`, returning the input `Arc` itself when nothing applies.
    #[must_use]
    pub fn rewrite(&self, clause: &Arc<Clause>) -> Arc<Clause> {
        let analysis = self.analyzer.analyze(clause);
        sink::record(OptimizeEvent::Analyzed {
            determined: analysis.is_determined(),
            projects: analysis.projects().len(),
        });

        if !analysis.is_determined() {
            return self.skip(clause, SkipReason::Undetermined);
        }
        if analysis.projects().is_empty() {
            return self.skip(clause, SkipReason::NoProjects);
        }

        let args: Vec<String> = analysis.into_projects().into_iter().collect();
        let mut visitor = RewriteVisitor {
            function: &self.function,
            args: &args,
            terminals: 0,
        };
        let Some(rewritten) = clause.accept(&mut visitor) else {
            return self.skip(clause, SkipReason::NoTarget);
        };

        sink::record(OptimizeEvent::Rewritten {
            function: &self.function,
            terminals: visitor.terminals,
        });

        Arc::new(rewritten)
    }

    fn skip(&self, clause: &Arc<Clause>, reason: SkipReason) -> Arc<Clause> {
        sink::record(OptimizeEvent::Skipped {
            function: &self.function,
            reason,
        });

        Arc::clone(clause)
    }
}

impl QueryOptimizer for FunctionRewrite {
    fn name(&self) -> &str {
        &self.function
    }

    fn optimize(&self, query: &Query) -> Query {
        let Some(clause) = query.where_clause() else {
            sink::record(OptimizeEvent::Skipped {
                function: &self.function,
                reason: SkipReason::NoClause,
            });
            return query.clone();
        };

        let rewritten = self.rewrite(clause);
        if Arc::ptr_eq(&rewritten, clause) {
            query.clone()
        } else {
            query.replace_where_clause(Some(rewritten))
        }
    }
}

///
/// RewriteVisitor
///
/// Yields `None` for a subtree that needs no change so the caller can keep
/// sharing the original node.
///

struct RewriteVisitor<'a> {
    function: &'a str,
    args: &'a [String],
    terminals: usize,
}

impl RewriteVisitor<'_> {
    fn rewrite_child(&mut self, child: &Arc<Clause>) -> Arc<Clause> {
        child
            .accept(self)
            .map_or_else(|| Arc::clone(child), Arc::new)
    }
}

impl ClauseVisitor for RewriteVisitor<'_> {
    type Output = Option<Clause>;

    fn visit_terminal(&mut self, clause: &TerminalClause) -> Self::Output {
        let Operand::Function(call) = clause.operand() else {
            return None;
        };
        if !call.is_zero_arg() || !call.is_named(self.function) {
            return None;
        }

        self.terminals += 1;
        let call = call.with_args(self.args.iter().cloned());

        Some(Clause::Terminal(clause.with_operand(Operand::Function(call))))
    }

    fn visit_and(&mut self, clause: &AndClause) -> Self::Output {
        clause
            .map_children(|child| self.rewrite_child(child))
            .map(Clause::And)
    }

    fn visit_or(&mut self, clause: &OrClause) -> Self::Output {
        clause
            .map_children(|child| self.rewrite_child(child))
            .map(Clause::Or)
    }

    fn visit_not(&mut self, clause: &NotClause) -> Self::Output {
        clause
            .map_child(|child| self.rewrite_child(child))
            .map(Clause::Not)
    }

    fn visit_was(&mut self, _: &WasClause) -> Self::Output {
        None
    }

    fn visit_changed(&mut self, _: &ChangedClause) -> Self::Output {
        None
    }
}

///
/// TESTS
///
