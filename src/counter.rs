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

//! The adaptive trial controller and the trial aggregator

use crate::cnf::CnfFormula;
use crate::enumerate::count_solutions;
use crate::gauss::{solve_xor_system, XorSolution};
use crate::simplify::{apply_assignment, SimplifyResult};
use crate::xor::XorGenerator;
use itertools::Itertools;
use serde::Serialize;
use std::fmt::Display;
use tracing::{debug, trace};

/// Configuration of an approximate counting run.
#[derive(Clone, Debug)]
pub struct CounterConfig {
    /// Number of independent hashing trials
    pub trials: usize,
    /// Inclusion probability of each variable in a random XOR
    pub density: f64,
    /// A trial is accepted once its cell holds at most this many models
    pub threshold: u64,
    /// Seed for the XOR generator; `None` seeds from the operating system
    pub seed: Option<u64>,
}

impl Default for CounterConfig {
    fn default() -> CounterConfig {
        CounterConfig {
            trials: 10,
            density: 0.1,
            threshold: 50,
            seed: None,
        }
    }
}

/// Outcome of one hashing trial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrialResult {
    /// No satisfying cell was found even without any XOR constraint.
    Unsat,
    /// A small enough cell was counted and scaled.
    Counted(TrialCount),
}

/// A counted cell, scaled back to the full solution space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrialCount {
    /// Cell count times 2^xors, saturating at `u64::MAX`
    pub scaled_count: u64,
    /// Number of XOR constraints the trial settled on
    pub xors: usize,
    /// Variables bound by the XOR system
    pub fixed_vars: usize,
    /// Variables the XOR system left free
    pub free_vars: usize,
}

/// Aggregation of all trials of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApproximationResult {
    /// Median of the scaled counts of successful trials
    pub estimated: u64,
    /// Mean of the scaled counts of successful trials
    pub average: f64,
    /// Number of successful trials
    pub successful: usize,
    /// Number of trials run
    pub total: usize,
    /// Scaled count of each successful trial, in trial order
    pub scaled_counts: Vec<u64>,
}

impl Display for ApproximationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Estimated models: {}, Influence {:.1}, Average {:.1}, Trials: {}/{} [{}]",
            self.estimated,
            (self.estimated as f64).log2(),
            self.average,
            self.successful,
            self.total,
            self.scaled_counts.iter().join(", "),
        )
    }
}

/// 2^k, saturating for k >= 64, applied to a cell count.
fn scale_count(cell: u64, xors: usize) -> u64 {
    let factor = if xors < 64 { 1u64 << xors } else { u64::MAX };
    cell.saturating_mul(factor)
}

/// Runs one adaptive trial: the number of XOR constraints grows from 0
/// until the surviving cell holds between 1 and `threshold` models, and the
/// cell count is scaled by 2^k.
///
/// An unsatisfiable XOR system, an unsatisfiable simplification or an empty
/// cell roll the trial back to the previous k, where a fresh family is
/// drawn and counted; at k = 0 they fail the trial instead.
pub fn single_trial(
    formula: &CnfFormula,
    gen: &mut XorGenerator,
    density: f64,
    threshold: u64,
) -> TrialResult {
    let nvars = formula.var_count();
    let cap = threshold + 10;
    let mut k = 0usize;
    while k < nvars {
        let xors = gen.family(nvars, k, density);
        let assignment = match solve_xor_system(&xors, nvars) {
            XorSolution::Unsat => {
                if k == 0 {
                    return TrialResult::Unsat;
                }
                k -= 1;
                break;
            }
            XorSolution::Sat(assignment) => assignment,
        };
        let simplified = match apply_assignment(formula, &assignment) {
            SimplifyResult::Unsat => {
                if k == 0 {
                    return TrialResult::Unsat;
                }
                k -= 1;
                break;
            }
            SimplifyResult::Simplified(simplified) => simplified,
        };
        let cell = count_solutions(&simplified.formula, cap);
        trace!(k, cell, remaining_clauses = simplified.formula.len(), "trial step");
        if cell == 0 {
            if k == 0 {
                return TrialResult::Unsat;
            }
            k -= 1;
            break;
        }
        if cell <= threshold {
            return TrialResult::Counted(TrialCount {
                scaled_count: scale_count(cell, k),
                xors: k,
                fixed_vars: assignment.assigned_count(),
                free_vars: assignment.free_count(),
            });
        }
        // the cell is still too big, add another hash
        k += 1;
    }

    // the loop settled on k without accepting: count one fresh cell there
    let xors = gen.family(nvars, k, density);
    let assignment = match solve_xor_system(&xors, nvars) {
        XorSolution::Unsat => return TrialResult::Unsat,
        XorSolution::Sat(assignment) => assignment,
    };
    let simplified = match apply_assignment(formula, &assignment) {
        SimplifyResult::Unsat => return TrialResult::Unsat,
        SimplifyResult::Simplified(simplified) => simplified,
    };
    let cell = count_solutions(&simplified.formula, cap);
    trace!(k, cell, "final trial count");
    if cell == 0 {
        return TrialResult::Unsat;
    }
    TrialResult::Counted(TrialCount {
        scaled_count: scale_count(cell, k),
        xors: k,
        fixed_vars: assignment.assigned_count(),
        free_vars: assignment.free_count(),
    })
}

/// Aggregates trial outcomes: the estimate is the median scaled count of
/// the successful trials (integer mean of the two middle elements when
/// their number is even), the average their mean in f64.
pub fn aggregate(trials: &[TrialResult]) -> ApproximationResult {
    let scaled_counts: Vec<u64> = trials
        .iter()
        .filter_map(|t| match t {
            TrialResult::Counted(c) => Some(c.scaled_count),
            TrialResult::Unsat => None,
        })
        .collect();
    let total = trials.len();
    let successful = scaled_counts.len();
    if successful == 0 {
        return ApproximationResult {
            estimated: 0,
            average: 0.0,
            successful,
            total,
            scaled_counts,
        };
    }
    let sorted: Vec<u64> = scaled_counts.iter().copied().sorted().collect();
    let mid = sorted.len() / 2;
    let estimated = if sorted.len() % 2 == 0 {
        ((sorted[mid - 1] as u128 + sorted[mid] as u128) / 2) as u64
    } else {
        sorted[mid]
    };
    let sum: u128 = scaled_counts.iter().map(|&c| c as u128).sum();
    let average = sum as f64 / successful as f64;
    ApproximationResult {
        estimated,
        average,
        successful,
        total,
        scaled_counts,
    }
}

/// Runs `config.trials` hashing trials over the formula and aggregates
/// them. With a fixed seed the whole run is deterministic.
pub fn approximate(formula: &CnfFormula, config: &CounterConfig) -> ApproximationResult {
    let mut gen = match config.seed {
        Some(seed) => XorGenerator::seeded(seed),
        None => XorGenerator::new(),
    };
    let trials: Vec<TrialResult> = (0..config.trials)
        .map(|trial| {
            let result = single_trial(formula, &mut gen, config.density, config.threshold);
            debug!(trial, ?result, "trial finished");
            result
        })
        .collect();
    aggregate(&trials)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cnf::DimacsParser;

    fn counted(scaled_count: u64) -> TrialResult {
        TrialResult::Counted(TrialCount {
            scaled_count,
            xors: 0,
            fixed_vars: 0,
            free_vars: 0,
        })
    }

    #[test]
    fn aggregate_median_odd() {
        let trials = vec![counted(8), counted(2), counted(4)];
        let result = aggregate(&trials);
        assert_eq!(result.estimated, 4);
        assert_eq!(result.successful, 3);
        assert_eq!(result.total, 3);
        assert!((result.average - 14.0 / 3.0).abs() < 1e-9);
        // trial order is preserved in the report
        assert_eq!(result.scaled_counts, vec![8, 2, 4]);
    }

    #[test]
    fn aggregate_median_even_uses_integer_mean() {
        let trials = vec![counted(2), counted(9), counted(4), TrialResult::Unsat, counted(100)];
        let result = aggregate(&trials);
        // sorted successful counts: 2 4 9 100, median (4 + 9) / 2 = 6
        assert_eq!(result.estimated, 6);
        assert_eq!(result.successful, 4);
        assert_eq!(result.total, 5);
    }

    #[test]
    fn aggregate_without_success() {
        let result = aggregate(&[TrialResult::Unsat, TrialResult::Unsat]);
        assert_eq!(result.estimated, 0);
        assert_eq!(result.average, 0.0);
        assert_eq!(result.successful, 0);
        assert_eq!(result.total, 2);
        assert!(result.scaled_counts.is_empty());
        assert_eq!(aggregate(&[]).total, 0);
    }

    #[test]
    fn scale_saturates() {
        assert_eq!(scale_count(3, 2), 12);
        assert_eq!(scale_count(1, 63), 1 << 63);
        assert_eq!(scale_count(2, 63), u64::MAX);
        assert_eq!(scale_count(1, 64), u64::MAX);
        assert_eq!(scale_count(50, 200), u64::MAX);
    }

    #[test]
    fn trial_on_contradiction_fails() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(b"p cnf 1 2\n1 0\n-1 0\n" as &[u8])?;
        let mut gen = XorGenerator::seeded(42);
        assert_eq!(single_trial(&formula, &mut gen, 0.5, 50), TrialResult::Unsat);
        Ok(())
    }

    #[test]
    fn trial_on_clauseless_formula_counts_the_space() -> anyhow::Result<()> {
        let formula = DimacsParser::parse(b"p cnf 3 0\n" as &[u8])?;
        let mut gen = XorGenerator::seeded(42);
        match single_trial(&formula, &mut gen, 0.5, 50) {
            TrialResult::Counted(c) => {
                assert_eq!(c.scaled_count, 8);
                assert_eq!(c.xors, 0);
                assert_eq!(c.fixed_vars, 0);
                assert_eq!(c.free_vars, 3);
            }
            TrialResult::Unsat => panic!("the empty formula has models"),
        }
        Ok(())
    }

    #[test]
    fn small_formulas_are_counted_exactly() -> anyhow::Result<()> {
        // 8 models: a tautological clause over 3 declared variables
        let formula = DimacsParser::parse(b"p cnf 3 1\n1 -1 0\n" as &[u8])?;
        let result = approximate(&formula, &CounterConfig {
            seed: Some(42),
            ..CounterConfig::default()
        });
        assert_eq!(result.estimated, 8);
        assert_eq!(result.average, 8.0);
        assert_eq!(result.successful, 10);
        assert_eq!(result.total, 10);

        // 6 models, still under the acceptance threshold at k = 0
        let formula = DimacsParser::parse(
            b"p cnf 3 3\n-1 3 -2 0\n-2 1 3 0\n3 -1 -2 0\n" as &[u8],
        )?;
        let result = approximate(&formula, &CounterConfig {
            seed: Some(42),
            ..CounterConfig::default()
        });
        assert_eq!(result.estimated, 6);
        Ok(())
    }

    #[test]
    fn unsatisfiable_formula_estimates_zero() -> anyhow::Result<()> {
        let formula =
            DimacsParser::parse(b"p cnf 2 4\n1 2 0\n-1 2 0\n1 -2 0\n-1 -2 0\n" as &[u8])?;
        let result = approximate(&formula, &CounterConfig {
            trials: 4,
            seed: Some(7),
            ..CounterConfig::default()
        });
        assert_eq!(result.estimated, 0);
        assert_eq!(result.successful, 0);
        assert_eq!(result.total, 4);
        Ok(())
    }

    #[test]
    fn seeded_runs_are_reproducible() -> anyhow::Result<()> {
        // enough models that trials actually have to grow k
        let formula = DimacsParser::parse(b"p cnf 7 1\n1 2 0\n" as &[u8])?;
        let config = CounterConfig {
            seed: Some(42),
            ..CounterConfig::default()
        };
        let first = approximate(&formula, &config);
        let second = approximate(&formula, &config);
        assert_eq!(first, second);
        assert_eq!(first.total, 10);
        assert_eq!(first.scaled_counts.len(), first.successful);
        Ok(())
    }
}
