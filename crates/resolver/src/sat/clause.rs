//! Constraint representation: clauses and cardinality bounds

use super::types::TruthValue;
use super::{Assignment, Literal};
use std::fmt;

/// A constraint over literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// At least one literal is true
    Clause(Vec<Literal>),
    /// At most `bound` literals are true
    AtMost { literals: Vec<Literal>, bound: usize },
}

/// What a constraint says about the current partial assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Satisfied,
    Conflict,
    /// These unassigned literals must become true
    Forced(Vec<Literal>),
    Open,
}

impl Constraint {
    #[must_use]
    pub fn clause(literals: Vec<Literal>) -> Self {
        Self::Clause(literals)
    }

    #[must_use]
    pub fn unit(literal: Literal) -> Self {
        Self::Clause(vec![literal])
    }

    /// At most `bound` of `literals` hold. Duplicate literals are removed.
    #[must_use]
    pub fn at_most(mut literals: Vec<Literal>, bound: usize) -> Self {
        literals.sort_unstable();
        literals.dedup();
        Self::AtMost { literals, bound }
    }

    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        match self {
            Self::Clause(literals) | Self::AtMost { literals, .. } => literals,
        }
    }

    /// Evaluate under a partial assignment
    #[must_use]
    pub fn status(&self, assignment: &Assignment) -> Status {
        match self {
            Self::Clause(literals) => {
                let mut unassigned = None;
                let mut open = 0usize;
                for &lit in literals {
                    match assignment.eval_literal(lit) {
                        TruthValue::True => return Status::Satisfied,
                        TruthValue::Unassigned => {
                            open += 1;
                            unassigned = Some(lit);
                        }
                        TruthValue::False => {}
                    }
                }
                match (open, unassigned) {
                    (0, _) => Status::Conflict,
                    (1, Some(lit)) => Status::Forced(vec![lit]),
                    _ => Status::Open,
                }
            }
            Self::AtMost { literals, bound } => {
                let mut true_count = 0usize;
                let mut unassigned = Vec::new();
                for &lit in literals {
                    match assignment.eval_literal(lit) {
                        TruthValue::True => true_count += 1,
                        TruthValue::Unassigned => unassigned.push(lit),
                        TruthValue::False => {}
                    }
                }
                if true_count > *bound {
                    Status::Conflict
                } else if true_count + unassigned.len() <= *bound {
                    Status::Satisfied
                } else if true_count == *bound {
                    Status::Forced(unassigned.into_iter().map(Literal::negate).collect())
                } else {
                    Status::Open
                }
            }
        }
    }

    /// Check against a complete assignment
    #[must_use]
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        matches!(self.status(assignment), Status::Satisfied)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literals: Vec<String> = self.literals().iter().map(ToString::to_string).collect();
        match self {
            Self::Clause(_) if literals.is_empty() => write!(f, "⊥"),
            Self::Clause(_) => write!(f, "({})", literals.join(" ∨ ")),
            Self::AtMost { bound, .. } => write!(f, "atmost{bound}({})", literals.join(", ")),
        }
    }
}
