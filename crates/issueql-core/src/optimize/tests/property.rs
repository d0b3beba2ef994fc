use crate::{
    optimize::QueryOptimizationService,
    query::{
        ChangedClause, Clause, FunctionOperand, Literal, Operand, Operator, OrderBy, Query,
        SearchSort, SortOrder, TerminalClause, WasClause,
    },
};
use issueql_config::{OptimizerConfig, TraversalPolicy};
use proptest::prelude::*;
use std::{collections::BTreeSet, sync::Arc};

///
/// Synthetic data
///
/// Every version belongs to exactly one project and every issue only ever
/// carries versions of its own project.
///

const PROJECTS: [&str; 3] = ["A", "B", "C"];
const STATUSES: [&str; 3] = ["Open", "Closed", "Resolved"];

// (version, owning project, released)
const VERSIONS: [(&str, &str, bool); 6] = [
    ("A-1", "A", true),
    ("A-2", "A", false),
    ("B-1", "B", true),
    ("B-2", "B", false),
    ("C-1", "C", true),
    ("C-2", "C", false),
];

#[derive(Clone, Debug)]
struct TestIssue {
    project: String,
    status: String,
    previous_status: Option<String>,
    fix_versions: BTreeSet<String>,
}

///
/// Evaluator
///

fn eval(issue: &TestIssue, clause: &Clause) -> bool {
    match clause {
        Clause::Terminal(terminal) => eval_terminal(issue, terminal),
        Clause::And(and) => and.children().iter().all(|child| eval(issue, child)),
        Clause::Or(or) => or.children().iter().any(|child| eval(issue, child)),
        Clause::Not(not) => !eval(issue, not.child()),
        Clause::Was(was) => was_status(issue, was),
        Clause::Changed(changed) => {
            changed.field() == "status"
                && issue
                    .previous_status
                    .as_ref()
                    .is_some_and(|previous| *previous != issue.status)
        }
    }
}

fn eval_terminal(issue: &TestIssue, terminal: &TerminalClause) -> bool {
    let value = match terminal.field() {
        "project" => &issue.project,
        "status" => &issue.status,
        "fixVersion" => return eval_versions(issue, terminal),
        other => panic!("unexpected field {other}"),
    };

    let matched = literals(terminal.operand()).contains(value);
    match terminal.operator() {
        Operator::Equals | Operator::In => matched,
        Operator::NotEquals | Operator::NotIn => !matched,
        other => panic!("unexpected operator {other}"),
    }
}

fn eval_versions(issue: &TestIssue, terminal: &TerminalClause) -> bool {
    let Operand::Function(call) = terminal.operand() else {
        panic!("fixVersion expects a function operand");
    };
    let versions = resolve(call);
    let matched = issue.fix_versions.iter().any(|v| versions.contains(v));

    match terminal.operator() {
        Operator::In => matched,
        Operator::NotIn => !matched,
        other => panic!("unexpected operator {other}"),
    }
}

fn was_status(issue: &TestIssue, was: &WasClause) -> bool {
    let values = literals(was.operand());

    values.contains(&issue.status)
        || issue
            .previous_status
            .as_ref()
            .is_some_and(|previous| values.contains(previous))
}

fn literals(operand: &Operand) -> BTreeSet<String> {
    match operand {
        Operand::Single(Literal::Text(value)) => BTreeSet::from([value.clone()]),
        Operand::Multi(multi) => multi.values().iter().flat_map(literals).collect(),
        other => panic!("unexpected operand {other}"),
    }
}

// Versions returned by a version function, scoped to its arguments if any.
fn resolve(call: &FunctionOperand) -> BTreeSet<String> {
    let released = if call.is_named("releasedVersions") {
        true
    } else if call.is_named("unreleasedVersions") {
        false
    } else {
        panic!("unexpected function {call}");
    };

    VERSIONS
        .iter()
        .filter(|(_, project, is_released)| {
            *is_released == released
                && (call.args().is_empty() || call.args().iter().any(|arg| arg == project))
        })
        .map(|(version, _, _)| (*version).to_string())
        .collect()
}

///
/// Strategies
///

fn arb_project() -> impl Strategy<Value = String> {
    prop::sample::select(PROJECTS.to_vec()).prop_map(String::from)
}

fn arb_status() -> impl Strategy<Value = String> {
    prop::sample::select(STATUSES.to_vec()).prop_map(String::from)
}

fn arb_project_clause_with(negated: BoxedStrategy<bool>) -> impl Strategy<Value = Clause> {
    let single = (negated.clone(), arb_project()).prop_map(|(negated, project)| {
        let operator = if negated {
            Operator::NotEquals
        } else {
            Operator::Equals
        };
        Clause::terminal("project", operator, Operand::text(project))
    });
    let multi = (negated, prop::collection::btree_set(arb_project(), 1..3)).prop_map(
        |(negated, projects)| {
            let operator = if negated {
                Operator::NotIn
            } else {
                Operator::In
            };
            let operand = Operand::multi(projects.into_iter().map(Operand::text)).unwrap();
            Clause::terminal("project", operator, operand)
        },
    );

    prop_oneof![single, multi]
}

fn arb_project_clause() -> impl Strategy<Value = Clause> {
    arb_project_clause_with(any::<bool>().boxed())
}

// `project != x` and `project not in (...)` only.
fn arb_unconfined_project_clause() -> impl Strategy<Value = Clause> {
    arb_project_clause_with(Just(true).boxed())
}

fn arb_version_call() -> impl Strategy<Value = Operand> {
    let name = prop::sample::select(vec![
        "releasedVersions",
        "ReleasedVersions",
        "RELEASEDVERSIONS",
        "unreleasedVersions",
        "UnreleasedVersions",
    ]);
    let args = prop_oneof![
        3 => Just(Vec::<String>::new()),
        1 => prop::collection::vec(arb_project(), 1..3),
    ];

    (name, args).prop_map(|(name, args)| Operand::function(name, args).unwrap())
}

fn arb_other_clause() -> impl Strategy<Value = Clause> {
    prop_oneof![
        (any::<bool>(), arb_status()).prop_map(|(negated, status)| {
            let operator = if negated {
                Operator::NotEquals
            } else {
                Operator::Equals
            };
            Clause::terminal("status", operator, Operand::text(status))
        }),
        (any::<bool>(), arb_version_call()).prop_map(|(negated, call)| {
            let operator = if negated {
                Operator::NotIn
            } else {
                Operator::In
            };
            Clause::terminal("fixVersion", operator, call)
        }),
        arb_status().prop_map(|status| {
            Clause::Was(WasClause::new(
                "status",
                Operator::Was,
                Operand::text(status),
                None,
            ))
        }),
        Just(Clause::Changed(ChangedClause::new("status", None))),
    ]
}

fn arb_tree(leaf: BoxedStrategy<Clause>) -> impl Strategy<Value = Clause> {
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(|children| Clause::and(children).unwrap()),
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(|children| Clause::or(children).unwrap()),
            inner.prop_map(|child| Clause::not(child)),
        ]
    })
}

fn arb_clause() -> impl Strategy<Value = Clause> {
    arb_tree(prop_oneof![arb_project_clause(), arb_other_clause()].boxed())
}

// No project terminal with a confining operator anywhere in the tree.
fn arb_unconfined_clause() -> impl Strategy<Value = Clause> {
    arb_tree(prop_oneof![arb_unconfined_project_clause(), arb_other_clause()].boxed())
}

fn arb_issue() -> impl Strategy<Value = TestIssue> {
    (
        arb_project(),
        arb_status(),
        prop::option::of(arb_status()),
        prop::sample::subsequence(vec![1_u8, 2], 0..=2),
    )
        .prop_map(|(project, status, previous_status, numbers)| {
            let fix_versions = numbers
                .into_iter()
                .map(|n| format!("{project}-{n}"))
                .collect();

            TestIssue {
                project,
                status,
                previous_status,
                fix_versions,
            }
        })
}

fn arb_service() -> impl Strategy<Value = QueryOptimizationService> {
    prop_oneof![
        Just(TraversalPolicy::Exhaustive),
        Just(TraversalPolicy::ShortCircuit)
    ]
    .prop_map(|traversal| {
        QueryOptimizationService::new(&OptimizerConfig {
            traversal,
            ..OptimizerConfig::default()
        })
    })
}

fn query_over(clause: Clause) -> Query {
    let order_by = OrderBy::new([
        SearchSort::new("priority", Some(SortOrder::Desc)),
        SearchSort::new("key", None),
    ]);

    Query::new(Some(Arc::new(clause)), Some(order_by)).with_query_string("generated")
}

fn matches(issues: &[TestIssue], query: &Query) -> Vec<bool> {
    let clause = query.where_clause().expect("generated queries carry a clause");

    issues.iter().map(|issue| eval(issue, clause)).collect()
}

proptest! {
    #[test]
    fn optimization_preserves_matches(
        clause in arb_clause(),
        issues in prop::collection::vec(arb_issue(), 1..16),
        service in arb_service(),
    ) {
        let query = query_over(clause);
        let optimized = service.optimize(&query);

        prop_assert_eq!(matches(&issues, &query), matches(&issues, &optimized));
    }

    #[test]
    fn optimization_is_idempotent(clause in arb_clause(), service in arb_service()) {
        let once = service.optimize(&query_over(clause));
        let twice = service.optimize(&once);

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn optimization_keeps_ordering(clause in arb_clause(), service in arb_service()) {
        let query = query_over(clause);
        let optimized = service.optimize(&query);

        prop_assert_eq!(optimized.order_by(), query.order_by());
        prop_assert_eq!(optimized.query_string(), query.query_string());
    }

    #[test]
    fn trees_without_confining_project_terms_are_untouched(
        clause in arb_unconfined_clause(),
        service in arb_service(),
    ) {
        let query = query_over(clause);
        let optimized = service.optimize(&query);

        prop_assert_eq!(&optimized, &query);
        prop_assert!(Arc::ptr_eq(
            optimized.where_clause().unwrap(),
            query.where_clause().unwrap()
        ));
    }

    #[test]
    fn traversal_policies_agree_on_matches(
        clause in arb_clause(),
        issues in prop::collection::vec(arb_issue(), 1..16),
    ) {
        let query = query_over(clause);
        let exhaustive = QueryOptimizationService::default().optimize(&query);
        let short = QueryOptimizationService::new(&OptimizerConfig {
            traversal: TraversalPolicy::ShortCircuit,
            ..OptimizerConfig::default()
        })
        .optimize(&query);

        prop_assert_eq!(matches(&issues, &exhaustive), matches(&issues, &short));
    }
}
