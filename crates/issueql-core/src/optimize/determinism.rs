use crate::query::{
    AndClause, ChangedClause, Clause, ClauseVisitor, FunctionOperand, Literal, MultiOperand,
    NotClause, Operand, OperandVisitor, OrClause, TerminalClause, WasClause,
};
use issueql_config::{OptimizerConfig, TraversalPolicy};
use std::collections::BTreeSet;

///
/// DeterminedProjects
///
/// Outcome of project-determinism analysis.
///
/// `determined` is `true` when every record the clause can match belongs to
/// a project named by the clause itself. `projects` holds the literal
/// project identifiers collected on the way; it is only meaningful when
/// `determined` is `true`.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeterminedProjects {
    determined: bool,
    projects: BTreeSet<String>,
}

impl DeterminedProjects {
    #[must_use]
    pub const fn is_determined(&self) -> bool {
        self.determined
    }

    #[must_use]
    pub const fn projects(&self) -> &BTreeSet<String> {
        &self.projects
    }

    #[must_use]
    pub fn into_projects(self) -> BTreeSet<String> {
        self.projects
    }
}

///
/// ProjectAnalyzer
///
/// Decides, without executing anything, whether a clause tree confines its
/// matches to a statically known set of projects.
///
/// - a terminal on the project field with `=`, `in` or `is` is determined
///   and contributes its literal values
/// - any other terminal is undetermined
/// - `NOT`, `was` and `changed` are always undetermined
/// - `AND` is determined if any child is
/// - `OR` is determined only if every child is
///

#[derive(Clone, Debug)]
pub struct ProjectAnalyzer {
    config: OptimizerConfig,
}

impl ProjectAnalyzer {
    #[must_use]
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    #[must_use]
    pub const fn traversal(&self) -> TraversalPolicy {
        self.config.traversal
    }

    #[must_use]
    pub fn analyze(&self, clause: &Clause) -> DeterminedProjects {
        let mut visitor = DeterminismVisitor {
            analyzer: self,
            projects: BTreeSet::new(),
        };
        let determined = clause.accept(&mut visitor);

        DeterminedProjects {
            determined,
            projects: visitor.projects,
        }
    }
}

impl Default for ProjectAnalyzer {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default())
    }
}

///
/// DeterminismVisitor
///

struct DeterminismVisitor<'a> {
    analyzer: &'a ProjectAnalyzer,
    projects: BTreeSet<String>,
}

impl ClauseVisitor for DeterminismVisitor<'_> {
    type Output = bool;

    fn visit_terminal(&mut self, clause: &TerminalClause) -> bool {
        let config = &self.analyzer.config;
        if !config.is_project_field(clause.field()) || !clause.operator().is_confining() {
            return false;
        }

        let operand = clause.operand();
        operand.accept(&mut ProjectLiterals {
            operand,
            projects: &mut self.projects,
        });

        true
    }

    fn visit_and(&mut self, clause: &AndClause) -> bool {
        match self.analyzer.traversal() {
            TraversalPolicy::ShortCircuit => {
                clause.children().iter().any(|child| child.accept(self))
            }
            TraversalPolicy::Exhaustive => {
                let mut determined = false;
                for child in clause.children() {
                    determined |= child.accept(self);
                }

                determined
            }
        }
    }

    fn visit_or(&mut self, clause: &OrClause) -> bool {
        match self.analyzer.traversal() {
            TraversalPolicy::ShortCircuit => {
                clause.children().iter().all(|child| child.accept(self))
            }
            TraversalPolicy::Exhaustive => {
                let mut determined = true;
                for child in clause.children() {
                    determined &= child.accept(self);
                }

                determined
            }
        }
    }

    fn visit_not(&mut self, _: &NotClause) -> bool {
        false
    }

    fn visit_was(&mut self, _: &WasClause) -> bool {
        false
    }

    fn visit_changed(&mut self, _: &ChangedClause) -> bool {
        false
    }
}

///
/// ProjectLiterals
///
/// Collects the literal values of a project operand. A multi-value operand
/// contributes its immediate single-value children only; nested lists and
/// function calls contribute nothing.
///

struct ProjectLiterals<'a> {
    operand: &'a Operand,
    projects: &'a mut BTreeSet<String>,
}

impl OperandVisitor for ProjectLiterals<'_> {
    type Output = ();

    fn visit_empty(&mut self) {}

    fn visit_single(&mut self, _: &Literal) {
        self.projects.insert(project_identifier(self.operand));
    }

    fn visit_multi(&mut self, multi: &MultiOperand) {
        for value in multi.values() {
            if value.accept(&mut IsSingle) {
                self.projects.insert(project_identifier(value));
            }
        }
    }

    fn visit_function(&mut self, _: &FunctionOperand) {}
}

///
/// IsSingle
///

struct IsSingle;

impl OperandVisitor for IsSingle {
    type Output = bool;

    fn visit_empty(&mut self) -> bool {
        false
    }

    fn visit_single(&mut self, _: &Literal) -> bool {
        true
    }

    fn visit_multi(&mut self, _: &MultiOperand) -> bool {
        false
    }

    fn visit_function(&mut self, _: &FunctionOperand) -> bool {
        false
    }
}

// Display strings quote text literals; identifiers are stored bare.
fn project_identifier(operand: &Operand) -> String {
    operand.display_string().trim_matches('"').to_string()
}

///
/// TESTS
///
