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

//! Bounded model enumeration by blocking clauses

use crate::cdcl;
use crate::cnf::{CnfFormula, ExtendFormula};
use crate::model::PartialAssignment;
use tracing::trace;

/// Counts models of `formula` up to `cap`, over the full variable space:
/// variables that appear in no clause still double the count.
///
/// Each found model is excluded by adding its blocking clause to a working
/// copy of the formula before solving again, so the result is exactly
/// `min(cap, |models|)`. A formula with no clauses is counted in closed
/// form; when its model space exceeds the 64 bit range the count saturates
/// to `u64::MAX` so callers still see a value above any practical cap.
pub fn count_solutions(formula: &CnfFormula, cap: u64) -> u64 {
    let nvars = formula.var_count();
    if formula.len() == 0 {
        if nvars >= 64 {
            return u64::MAX;
        }
        return (1u64 << nvars).min(cap);
    }

    let mut work = CnfFormula::new();
    work.set_var_count(nvars);
    for clause in formula.iter() {
        work.add_clause(clause);
    }

    let unconstrained = PartialAssignment::new(nvars);
    let mut count = 0u64;
    while count < cap {
        let model = match cdcl::solve(&work, &unconstrained) {
            Some(model) => model,
            None => break,
        };
        count += 1;
        work.add_clause(&model.blocking_clause());
    }
    trace!(count, cap, "bounded enumeration finished");
    count
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cnf::DimacsParser;
    use num_traits::ToPrimitive;

    #[test]
    fn clauseless_formula_counts_in_closed_form() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(b"p cnf 3 0\n" as &[u8])?;
        assert_eq!(count_solutions(&formula, 100), 8);
        assert_eq!(count_solutions(&formula, 5), 5);
        let formula = DimacsParser::parse(b"p cnf 0 0\n" as &[u8])?;
        assert_eq!(count_solutions(&formula, 100), 1);
        Ok(())
    }

    #[test]
    fn tautology_counts_both_polarities() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(b"p cnf 1 1\n1 -1 0\n" as &[u8])?;
        assert_eq!(count_solutions(&formula, 100), 2);
        Ok(())
    }

    #[test]
    fn unused_variables_multiply_the_count() -> anyhow::Result<()> {
        // (1 | -1) over 3 declared variables: 2 * 2^2 models
        let formula = DimacsParser::parse(b"p cnf 3 1\n1 -1 0\n" as &[u8])?;
        assert_eq!(count_solutions(&formula, 100), 8);
        Ok(())
    }

    #[test]
    fn unsat_formula_counts_zero() -> anyhow::Result<()> {
        let formula =
            DimacsParser::parse(b"p cnf 2 4\n1 2 0\n-1 2 0\n1 -2 0\n-1 -2 0\n" as &[u8])?;
        assert_eq!(count_solutions(&formula, 100), 0);
        Ok(())
    }

    #[test]
    fn cap_is_respected() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(b"p cnf 4 1\n1 2 0\n" as &[u8])?;
        // 12 models in total
        assert_eq!(count_solutions(&formula, 7), 7);
        assert_eq!(count_solutions(&formula, 12), 12);
        assert_eq!(count_solutions(&formula, 100), 12);
        assert_eq!(count_solutions(&formula, 0), 0);
        Ok(())
    }

    #[test]
    fn counts_the_bundled_formulas() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(std::fs::File::open("assets/simple.cnf")?)?;
        assert_eq!(count_solutions(&formula, 100), 6);
        let formula = DimacsParser::parse(std::fs::File::open("assets/unsat.cnf")?)?;
        assert_eq!(count_solutions(&formula, 100), 0);
        Ok(())
    }

    #[test]
    fn matches_brute_force_on_random_formulas() {
        for _ in 0..10 {
            let formula = crate::cnf::generate_random_3sat(5, 8);
            let exact = crate::cnf::brute_force_model_count(&formula)
                .model_count
                .to_u64()
                .expect("small count");
            assert_eq!(count_solutions(&formula, 1000), exact);
        }
    }
}
