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

//! Gaussian elimination of XOR systems over GF(2)

use crate::cnf::Var;
use crate::model::PartialAssignment;
use crate::xor::XorConstraint;
use fixedbitset::FixedBitSet;
use tracing::trace;

/// Outcome of solving an XOR system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XorSolution {
    /// The system has no solution over GF(2).
    Unsat,
    /// The canonical solution: pivot variables are bound, the rest are free.
    ///
    /// The bound values describe the affine solution set with every free
    /// variable chosen as 0; downstream simplification must treat free
    /// variables as genuinely unassigned.
    Sat(PartialAssignment),
}

/// Solves a family of XOR constraints over `nvars` variables by full
/// reduction to reduced row echelon form.
///
/// Rows are bit-packed: one [`FixedBitSet`] per constraint, with columns
/// `0..nvars` holding coefficients and column `nvars` the right-hand side.
pub fn solve_xor_system(xors: &[XorConstraint], nvars: usize) -> XorSolution {
    if xors.is_empty() {
        return XorSolution::Sat(PartialAssignment::new(nvars));
    }

    let mut rows: Vec<FixedBitSet> = Vec::with_capacity(xors.len());
    for constraint in xors {
        let mut row = FixedBitSet::with_capacity(nvars + 1);
        for &var in &constraint.vars {
            // out of range variables cannot constrain anything
            if var.index() < nvars {
                row.insert(var.index());
            }
        }
        if constraint.parity {
            row.insert(nvars);
        }
        rows.push(row);
    }

    // forward elimination, reducing above and below the pivot
    let mut pivots: Vec<(usize, usize)> = Vec::new();
    let mut next_row = 0;
    for col in 0..nvars {
        if next_row >= rows.len() {
            break;
        }
        let pivot_row = match (next_row..rows.len()).find(|&r| rows[r].contains(col)) {
            Some(r) => r,
            None => continue,
        };
        rows.swap(next_row, pivot_row);
        let pivot = rows[next_row].clone();
        for (r, row) in rows.iter_mut().enumerate() {
            if r != next_row && row.contains(col) {
                row.symmetric_difference_with(&pivot);
            }
        }
        pivots.push((next_row, col));
        next_row += 1;
    }

    // a row with no coefficients left but parity 1 is a contradiction
    for row in &rows {
        if row.contains(nvars) && row.count_ones(..nvars) == 0 {
            trace!(constraints = xors.len(), "xor system is unsatisfiable");
            return XorSolution::Unsat;
        }
    }

    let mut assignment = PartialAssignment::new(nvars);
    for &(row, col) in &pivots {
        assignment.assign(Var::from_index(col), rows[row].contains(nvars));
    }
    trace!(
        constraints = xors.len(),
        bound = pivots.len(),
        free = nvars - pivots.len(),
        "solved xor system"
    );
    XorSolution::Sat(assignment)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::Model;
    use crate::xor::XorGenerator;

    fn xor(vars: &[isize], parity: bool) -> XorConstraint {
        XorConstraint {
            vars: vars.iter().map(|&v| Var::from_dimacs(v)).collect(),
            parity,
        }
    }

    /// substitutes the canonical solution (frees at 0) into every constraint
    fn check_solution(xors: &[XorConstraint], nvars: usize, assignment: &PartialAssignment) {
        let mut model = Model::empty(nvars);
        for (var, value) in assignment.iter_assigned() {
            model.set(var, value);
        }
        for constraint in xors {
            assert!(constraint.holds_under(&model), "violated: {:?}", constraint);
        }
    }

    #[test]
    fn empty_system_is_all_free() {
        match solve_xor_system(&[], 5) {
            XorSolution::Sat(a) => {
                assert_eq!(a.free_count(), 5);
                assert_eq!(a.assigned_count(), 0);
            }
            XorSolution::Unsat => panic!("empty system must be satisfiable"),
        }
    }

    #[test]
    fn no_variables_at_all() {
        assert_eq!(solve_xor_system(&[], 0), XorSolution::Sat(PartialAssignment::new(0)));
        // an empty constraint with parity 1 demands 0 = 1
        assert_eq!(solve_xor_system(&[xor(&[], true)], 0), XorSolution::Unsat);
        assert!(matches!(
            solve_xor_system(&[xor(&[], false)], 0),
            XorSolution::Sat(_)
        ));
    }

    #[test]
    fn single_constraint_fixes_pivot() {
        // x1 + x2 = 1: pivot x1 bound to 1, x2 free at 0
        let xors = vec![xor(&[1, 2], true)];
        match solve_xor_system(&xors, 2) {
            XorSolution::Sat(a) => {
                assert_eq!(a.value(Var::from_dimacs(1)), Some(true));
                assert_eq!(a.value(Var::from_dimacs(2)), None);
                check_solution(&xors, 2, &a);
            }
            XorSolution::Unsat => panic!("satisfiable system"),
        }
    }

    #[test]
    fn contradiction_is_detected() {
        // x1 + x2 = 0 and x1 + x2 = 1
        let xors = vec![xor(&[1, 2], false), xor(&[1, 2], true)];
        assert_eq!(solve_xor_system(&xors, 2), XorSolution::Unsat);
    }

    #[test]
    fn dependent_rows_are_harmless() {
        // the second row is the sum of the first two, consistent
        let xors = vec![
            xor(&[1], true),
            xor(&[2], false),
            xor(&[1, 2], true),
        ];
        match solve_xor_system(&xors, 3) {
            XorSolution::Sat(a) => {
                assert_eq!(a.value(Var::from_dimacs(1)), Some(true));
                assert_eq!(a.value(Var::from_dimacs(2)), Some(false));
                assert_eq!(a.value(Var::from_dimacs(3)), None);
                check_solution(&xors, 3, &a);
            }
            XorSolution::Unsat => panic!("satisfiable system"),
        }
    }

    #[test]
    fn random_systems_are_sound() {
        let mut gen = XorGenerator::seeded(1234);
        for round in 0..50 {
            let nvars = 1 + (round % 8);
            let xors = gen.family(nvars, round % 6, 0.5);
            if let XorSolution::Sat(a) = solve_xor_system(&xors, nvars) {
                assert_eq!(a.assigned_count() + a.free_count(), nvars);
                check_solution(&xors, nvars, &a);
            }
        }
    }

    #[test]
    fn full_rank_system_binds_everything() {
        let xors = vec![xor(&[1], false), xor(&[2], true), xor(&[3], true)];
        match solve_xor_system(&xors, 3) {
            XorSolution::Sat(a) => {
                assert_eq!(a.free_count(), 0);
                assert_eq!(a.value(Var::from_dimacs(1)), Some(false));
                assert_eq!(a.value(Var::from_dimacs(2)), Some(true));
                assert_eq!(a.value(Var::from_dimacs(3)), Some(true));
            }
            XorSolution::Unsat => panic!("satisfiable system"),
        }
    }
}
