/**************************************************************************/
/*  This file is part of XORCOUNT.                                        */
/*                                                                        */
/*  Copyright (C) 2025                                                    */
/*    CEA (Commissariat à l'énergie atomique et aux énergies              */
/*         alternatives)                                                  */
/*                                                                        */
/*  you can redistribute it and/or modify it under the terms of the GNU   */
/*  Lesser General Public License as published by the Free Software       */
/*  Foundation, version 2.1.                                              */
/*                                                                        */
/*  It is distributed in the hope that it will be useful,                 */
/*  but WITHOUT ANY WARRANTY; without even the implied warranty of        */
/*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the         */
/*  GNU Lesser General Public License for more details.                   */
/*                                                                        */
/*  See the GNU Lesser General Public License version 2.1                 */
/*  for more details (enclosed in the file licenses/LGPLv2.1).            */
/*                                                                        */
/**************************************************************************/

//! Simplification of CNF formulas under a partial assignment

use crate::cnf::{CnfFormula, ExtendFormula};
use crate::gauss::XorSolution;
use crate::model::PartialAssignment;
use tracing::trace;

/// Outcome of applying a partial assignment to a formula.
#[derive(Debug, PartialEq)]
pub enum SimplifyResult {
    /// Some clause lost all its literals: the assignment falsifies the formula.
    Unsat,
    /// The residual formula over the free variables.
    Simplified(Simplified),
}

/// A simplified formula together with reduction statistics.
#[derive(Debug, PartialEq)]
pub struct Simplified {
    /// The residual formula. Its variable count is that of the input, so
    /// free variables stay part of the model space even when no clause
    /// mentions them anymore.
    pub formula: CnfFormula,
    /// Number of satisfied clauses dropped
    pub clauses_removed: usize,
    /// Number of falsified literals dropped from kept clauses
    pub literals_removed: usize,
}

impl Simplified {
    /// true when every clause was satisfied, leaving the residual formula empty
    pub fn is_trivially_true(&self) -> bool {
        self.formula.len() == 0
    }
}

/// Applies a partial assignment to a formula: satisfied clauses are
/// dropped, falsified literals are removed from the remaining clauses.
/// An emptied clause means the assignment contradicts the formula.
pub fn apply_assignment(formula: &CnfFormula, assignment: &PartialAssignment) -> SimplifyResult {
    let mut simplified = CnfFormula::new();
    simplified.set_var_count(formula.var_count());
    let mut clauses_removed = 0;
    let mut literals_removed = 0;
    let mut kept = Vec::new();

    'clauses: for clause in formula.iter() {
        kept.clear();
        for &lit in clause {
            match assignment.lit_value(lit) {
                Some(true) => {
                    clauses_removed += 1;
                    continue 'clauses;
                }
                Some(false) => literals_removed += 1,
                None => kept.push(lit),
            }
        }
        if kept.is_empty() {
            return SimplifyResult::Unsat;
        }
        simplified.add_clause(&kept);
    }

    trace!(
        clauses_removed,
        literals_removed,
        remaining = simplified.len(),
        "applied partial assignment"
    );
    SimplifyResult::Simplified(Simplified {
        formula: simplified,
        clauses_removed,
        literals_removed,
    })
}

/// Applies the canonical solution of an XOR system: an unsatisfiable system
/// makes the whole formula unsatisfiable, otherwise the bound variables are
/// substituted and the free ones are left untouched.
pub fn apply_xor_solution(formula: &CnfFormula, solution: &XorSolution) -> SimplifyResult {
    match solution {
        XorSolution::Unsat => SimplifyResult::Unsat,
        XorSolution::Sat(assignment) => apply_assignment(formula, assignment),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cnf::{DimacsParser, Var};

    fn assign(nvars: usize, bindings: &[(isize, bool)]) -> PartialAssignment {
        let mut a = PartialAssignment::new(nvars);
        for &(var, value) in bindings {
            a.assign(Var::from_dimacs(var), value);
        }
        a
    }

    #[test]
    fn satisfied_clauses_are_dropped() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(b"p cnf 3 2\n1 2 0\n-1 3 0\n" as &[u8])?;
        match apply_assignment(&formula, &assign(3, &[(1, true)])) {
            SimplifyResult::Simplified(s) => {
                assert_eq!(s.clauses_removed, 1);
                assert_eq!(s.literals_removed, 1);
                assert_eq!(s.formula.len(), 1);
                assert_eq!(s.formula.var_count(), 3);
                assert!(!s.is_trivially_true());
            }
            SimplifyResult::Unsat => panic!("still satisfiable"),
        }
        Ok(())
    }

    #[test]
    fn emptied_clause_is_unsat() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(b"p cnf 2 1\n1 2 0\n" as &[u8])?;
        assert_eq!(
            apply_assignment(&formula, &assign(2, &[(1, false), (2, false)])),
            SimplifyResult::Unsat
        );
        Ok(())
    }

    #[test]
    fn all_clauses_satisfied_is_trivially_true() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(b"p cnf 2 2\n1 0\n1 2 0\n" as &[u8])?;
        match apply_assignment(&formula, &assign(2, &[(1, true)])) {
            SimplifyResult::Simplified(s) => {
                assert!(s.is_trivially_true());
                assert_eq!(s.clauses_removed, 2);
                // the variable count survives even with no clause left
                assert_eq!(s.formula.var_count(), 2);
            }
            SimplifyResult::Unsat => panic!("still satisfiable"),
        }
        Ok(())
    }

    #[test]
    fn simplification_is_idempotent() -> anyhow::Result<()> {
        let formula =
            DimacsParser::parse(b"p cnf 4 3\n1 2 3 0\n-2 4 0\n-1 -3 4 0\n" as &[u8])?;
        let sigma = assign(4, &[(2, false), (3, true)]);
        let once = match apply_assignment(&formula, &sigma) {
            SimplifyResult::Simplified(s) => s,
            SimplifyResult::Unsat => panic!("still satisfiable"),
        };
        let twice = match apply_assignment(&once.formula, &sigma) {
            SimplifyResult::Simplified(s) => s,
            SimplifyResult::Unsat => panic!("still satisfiable"),
        };
        assert_eq!(once.formula, twice.formula);
        assert_eq!(twice.clauses_removed, 0);
        assert_eq!(twice.literals_removed, 0);
        Ok(())
    }

    #[test]
    fn simplification_preserves_extending_models() -> anyhow::Result<()> {
        use crate::model::Model;
        let formula =
            DimacsParser::parse(b"p cnf 4 3\n1 2 3 0\n-2 4 0\n-1 -3 4 0\n" as &[u8])?;
        let sigma = assign(4, &[(1, true), (3, false)]);
        let simplified = match apply_assignment(&formula, &sigma) {
            SimplifyResult::Simplified(s) => s,
            SimplifyResult::Unsat => panic!("still satisfiable"),
        };
        // on assignments extending sigma, the residual formula agrees with
        // the original one
        let mut m = Model::first_model(4);
        loop {
            let extends = sigma
                .iter_assigned()
                .all(|(var, value)| m.value(var) == value);
            if extends {
                assert_eq!(m.satisfies(&formula), m.satisfies(&simplified.formula));
            }
            if !m.next_model() {
                break;
            }
        }
        Ok(())
    }

    #[test]
    fn xor_unsat_propagates() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(b"p cnf 2 1\n1 2 0\n" as &[u8])?;
        assert_eq!(
            apply_xor_solution(&formula, &XorSolution::Unsat),
            SimplifyResult::Unsat
        );
        let free = XorSolution::Sat(PartialAssignment::new(2));
        match apply_xor_solution(&formula, &free) {
            SimplifyResult::Simplified(s) => assert_eq!(s.formula.len(), 1),
            SimplifyResult::Unsat => panic!("no binding applied"),
        }
        Ok(())
    }
}
