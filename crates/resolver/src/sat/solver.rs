//! DPLL search with unit propagation and chronological backtracking

use super::clause::Status;
use super::{Assignment, Constraint, Literal, Variable};
use crate::hooks::Nudge;
use std::fmt;
use tracing::trace;

/// Incremental SAT solver over clauses and at-most-k constraints.
///
/// Constraints are permanent once added. [`SatSolver::solve_assuming`]
/// checks extra constraints for one search only, which is what the
/// optimization passes use to try candidate choices.
#[derive(Clone, Default)]
pub struct SatSolver {
    num_vars: usize,
    constraints: Vec<Constraint>,
    /// Constraint indices mentioning each variable
    occurrences: Vec<Vec<usize>>,
    nudge: Option<Nudge>,
    nudge_interval: u64,
    stats: SolverStats,
}

/// Search statistics, accumulated across every solve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub solves: u64,
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
}

#[derive(Debug, Clone, Copy)]
struct Decision {
    trail_len: usize,
    literal: Literal,
    flipped: bool,
}

struct SearchState {
    assignment: Assignment,
    trail: Vec<Variable>,
    decisions: Vec<Decision>,
}

impl SearchState {
    fn assign(&mut self, lit: Literal) {
        self.assignment.assign(lit);
        self.trail.push(lit.variable());
    }

    fn undo_to(&mut self, trail_len: usize) {
        while self.trail.len() > trail_len {
            if let Some(var) = self.trail.pop() {
                self.assignment.unassign(var);
            }
        }
    }
}

impl SatSolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `nudge` every `interval` decisions
    #[must_use]
    pub fn with_nudge(mut self, nudge: Option<Nudge>, interval: u64) -> Self {
        self.nudge = nudge;
        self.nudge_interval = interval;
        self
    }

    pub fn new_variable(&mut self) -> Variable {
        let var = Variable::new(self.num_vars);
        self.num_vars += 1;
        self.occurrences.push(Vec::new());
        var
    }

    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.num_vars
    }

    #[must_use]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    #[must_use]
    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    pub fn add_clause(&mut self, literals: Vec<Literal>) {
        self.add_constraint(Constraint::clause(literals));
    }

    pub fn add_at_most(&mut self, literals: Vec<Literal>, bound: usize) {
        self.add_constraint(Constraint::at_most(literals, bound));
    }

    pub fn add_at_most_one(&mut self, variables: &[Variable]) {
        if variables.len() > 1 {
            self.add_at_most(variables.iter().copied().map(Literal::positive).collect(), 1);
        }
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        let index = self.constraints.len();
        for lit in constraint.literals() {
            if let Some(list) = self.occurrences.get_mut(lit.variable().index()) {
                if list.last() != Some(&index) {
                    list.push(index);
                }
            }
        }
        self.constraints.push(constraint);
    }

    /// Find a model of every constraint added so far
    pub fn solve(&mut self) -> Option<Assignment> {
        self.search()
    }

    /// Find a model that also satisfies `extra`, without keeping `extra`
    pub fn solve_assuming(&mut self, extra: Vec<Constraint>) -> Option<Assignment> {
        let mark = self.constraints.len();
        for constraint in extra {
            self.add_constraint(constraint);
        }
        let model = self.search();
        self.truncate(mark);
        model
    }

    /// Minimize the number of true `literals`, then keep that minimum as a
    /// permanent bound. Returns the minimum and a model attaining it, or
    /// `None` if the constraints are unsatisfiable.
    pub fn minimize(&mut self, literals: &[Literal]) -> Option<(usize, Assignment)> {
        let mut best = self.solve()?;
        let mut cost = best.count_true(literals);
        while cost > 0 {
            match self.solve_assuming(vec![Constraint::at_most(literals.to_vec(), cost - 1)]) {
                Some(model) => {
                    cost = model.count_true(literals);
                    best = model;
                }
                None => break,
            }
        }
        if !literals.is_empty() {
            self.add_at_most(literals.to_vec(), cost);
        }
        Some((cost, best))
    }

    fn truncate(&mut self, mark: usize) {
        while self.constraints.len() > mark {
            let index = self.constraints.len() - 1;
            if let Some(constraint) = self.constraints.pop() {
                for lit in constraint.literals() {
                    if let Some(list) = self.occurrences.get_mut(lit.variable().index()) {
                        if list.last() == Some(&index) {
                            list.pop();
                        }
                    }
                }
            }
        }
    }

    fn search(&mut self) -> Option<Assignment> {
        self.stats.solves += 1;
        let mut state = SearchState {
            assignment: Assignment::new(self.num_vars),
            trail: Vec::new(),
            decisions: Vec::new(),
        };

        let everything: Vec<usize> = (0..self.constraints.len()).collect();
        if !self.propagate(&mut state, everything) {
            trace!(constraints = self.constraints.len(), "unsatisfiable at level 0");
            return None;
        }

        loop {
            let Some(var) = state.assignment.first_unassigned() else {
                return Some(state.assignment);
            };
            self.note_decision();
            let literal = Literal::negative(var);
            state.decisions.push(Decision {
                trail_len: state.trail.len(),
                literal,
                flipped: false,
            });
            let mut pending = self.assign(&mut state, literal);

            while !self.propagate(&mut state, pending) {
                self.stats.conflicts += 1;
                pending = loop {
                    let decision = state.decisions.pop()?;
                    state.undo_to(decision.trail_len);
                    if !decision.flipped {
                        let flipped = decision.literal.negate();
                        state.decisions.push(Decision {
                            trail_len: decision.trail_len,
                            literal: flipped,
                            flipped: true,
                        });
                        break self.assign(&mut state, flipped);
                    }
                };
            }
        }
    }

    /// Assign and return the constraints to re-examine
    fn assign(&self, state: &mut SearchState, lit: Literal) -> Vec<usize> {
        state.assign(lit);
        self.occurrences
            .get(lit.variable().index())
            .cloned()
            .unwrap_or_default()
    }

    /// Unit propagation. Returns false on conflict.
    fn propagate(&mut self, state: &mut SearchState, mut queue: Vec<usize>) -> bool {
        while let Some(index) = queue.pop() {
            let Some(constraint) = self.constraints.get(index) else {
                continue;
            };
            match constraint.status(&state.assignment) {
                Status::Conflict => return false,
                Status::Forced(literals) => {
                    for lit in literals {
                        if !state.assignment.get(lit.variable()).is_assigned() {
                            self.stats.propagations += 1;
                            queue.extend(self.assign(state, lit));
                        }
                    }
                }
                Status::Satisfied | Status::Open => {}
            }
        }
        true
    }

    fn note_decision(&mut self) {
        self.stats.decisions += 1;
        if let Some(nudge) = &self.nudge {
            if self.nudge_interval > 0 && self.stats.decisions % self.nudge_interval == 0 {
                nudge();
            }
        }
    }
}

impl fmt::Debug for SatSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SatSolver")
            .field("num_vars", &self.num_vars)
            .field("constraints", &self.constraints.len())
            .field("nudge_interval", &self.nudge_interval)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
