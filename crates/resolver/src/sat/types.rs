//! Basic types for SAT solving

use std::fmt;

/// A boolean variable in the SAT problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(usize);

impl Variable {
    /// Create new variable with given index
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the variable index
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A literal is a variable or its negation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    variable: Variable,
    positive: bool,
}

impl Literal {
    /// Create a positive literal
    #[must_use]
    pub const fn positive(variable: Variable) -> Self {
        Self {
            variable,
            positive: true,
        }
    }

    /// Create a negative literal
    #[must_use]
    pub const fn negative(variable: Variable) -> Self {
        Self {
            variable,
            positive: false,
        }
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        self.variable
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.positive
    }

    /// Negate the literal
    #[must_use]
    pub const fn negate(self) -> Self {
        Self {
            variable: self.variable,
            positive: !self.positive,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}", self.variable)
        } else {
            write!(f, "¬{}", self.variable)
        }
    }
}

/// Truth value for a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruthValue {
    True,
    False,
    Unassigned,
}

impl TruthValue {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::True | Self::False)
    }

    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::False)
    }
}

/// Values of every variable, indexed by variable
///
/// A complete assignment returned by the solver is a model: every variable
/// is assigned and every constraint holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<TruthValue>,
}

impl Assignment {
    /// Create an assignment with every variable unassigned
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            values: vec![TruthValue::Unassigned; num_vars],
        }
    }

    #[must_use]
    pub fn get(&self, var: Variable) -> TruthValue {
        self.values
            .get(var.index())
            .copied()
            .unwrap_or(TruthValue::Unassigned)
    }

    #[must_use]
    pub fn is_true(&self, var: Variable) -> bool {
        self.get(var).is_true()
    }

    /// Evaluate a literal under this assignment
    #[must_use]
    pub fn eval_literal(&self, lit: Literal) -> TruthValue {
        match self.get(lit.variable()) {
            TruthValue::Unassigned => TruthValue::Unassigned,
            TruthValue::True if lit.is_positive() => TruthValue::True,
            TruthValue::False if !lit.is_positive() => TruthValue::True,
            _ => TruthValue::False,
        }
    }

    /// Make `lit` true
    pub fn assign(&mut self, lit: Literal) {
        if let Some(slot) = self.values.get_mut(lit.variable().index()) {
            *slot = if lit.is_positive() {
                TruthValue::True
            } else {
                TruthValue::False
            };
        }
    }

    pub fn unassign(&mut self, var: Variable) {
        if let Some(slot) = self.values.get_mut(var.index()) {
            *slot = TruthValue::Unassigned;
        }
    }

    /// First variable without a value, scanning by index
    #[must_use]
    pub fn first_unassigned(&self) -> Option<Variable> {
        self.values
            .iter()
            .position(|value| !value.is_assigned())
            .map(Variable::new)
    }

    /// Number of the given literals that are true
    #[must_use]
    pub fn count_true(&self, literals: &[Literal]) -> usize {
        literals
            .iter()
            .filter(|&&lit| self.eval_literal(lit).is_true())
            .count()
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_evaluation() {
        let x = Variable::new(0);
        let mut assignment = Assignment::new(2);
        assert_eq!(
            assignment.eval_literal(Literal::positive(x)),
            TruthValue::Unassigned
        );
        assignment.assign(Literal::negative(x));
        assert!(assignment.eval_literal(Literal::negative(x)).is_true());
        assert!(assignment.eval_literal(Literal::positive(x)).is_false());
        assert_eq!(assignment.first_unassigned(), Some(Variable::new(1)));
        assignment.unassign(x);
        assert_eq!(assignment.first_unassigned(), Some(x));
    }

    #[test]
    fn test_negate_round_trip() {
        let lit = Literal::positive(Variable::new(3));
        assert_eq!(lit.negate().negate(), lit);
        assert_eq!(lit.negate().to_string(), "¬v3");
    }
}
