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

//! CNF formulas

use crate::model::Model;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Serialize, Serializer};
use std::fmt::Display;
pub use varisat_dimacs::{write_dimacs, DimacsParser};
pub use varisat_formula::{CnfFormula, ExtendFormula, Lit, Var};

/// Converts a formula to dimacs in a string, for debugging.
pub fn to_dimacs_string(f: &CnfFormula) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    write_dimacs(&mut buf, f)?;
    Ok(String::from_utf8(buf)?)
}

/// returns a random 3sat cnf formula with specified number of variables and clauses
#[cfg(test)]
pub fn generate_random_3sat(nvars: usize, nclauses: usize) -> CnfFormula {
    use std::iter::FromIterator;
    let mut f = CnfFormula::new();
    let mut rng = rand::thread_rng();
    f.set_var_count(nvars);
    for _ in 0..nclauses {
        let chosen = rand::seq::index::sample(&mut rng, nvars, 3);
        let clause = Vec::from_iter(chosen.iter().map(|v| {
            let v = Var::from_index(v);
            Lit::from_var(v, rand::random())
        }));
        f.add_clause(&clause);
    }
    f
}

/// returns the model count of the formula by testing all models sequentially.
pub fn brute_force_model_count(f: &CnfFormula) -> ModelCount {
    let mut m = Model::first_model(f.var_count());
    let mut n = BigUint::zero();
    loop {
        if m.satisfies(&f) {
            n += BigUint::one();
        }
        if !m.next_model() {
            break;
        }
    }
    ModelCount {
        model_count: n,
        bits: f.var_count(),
    }
}

#[test]
fn brute_force_small_formulas() -> anyhow::Result<()> {
    // (1 | 2) has 3 models out of 4
    let formula = DimacsParser::parse(b"p cnf 2 1\n1 2 0\n" as &[u8])?;
    assert_eq!(
        brute_force_model_count(&formula),
        ModelCount {
            model_count: 3u32.into(),
            bits: 2
        }
    );
    // a contradiction has none
    let formula = DimacsParser::parse(b"p cnf 1 2\n1 0\n-1 0\n" as &[u8])?;
    assert_eq!(
        brute_force_model_count(&formula),
        ModelCount {
            model_count: 0u32.into(),
            bits: 1
        }
    );
    // no clauses: the whole space
    let formula = DimacsParser::parse(b"p cnf 3 0\n" as &[u8])?;
    assert_eq!(
        brute_force_model_count(&formula),
        ModelCount {
            model_count: 8u32.into(),
            bits: 3
        }
    );
    Ok(())
}

fn biguint_to_string<S: Serializer>(n: &BigUint, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&n.to_string())
}

/// The result of counting models of a formula exactly
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ModelCount {
    /// Number of models of the formula
    #[serde(serialize_with = "biguint_to_string")]
    pub model_count: BigUint,
    /// Number of bits of the full model space
    pub bits: usize,
}

/// Returns the 2-based logarithm of biguint at 0.1 precision.
/// # Example
/// ```
/// pub use xorcount::cnf::log2;
/// pub use num_bigint::BigUint;
/// assert_eq!(log2(&0u32.into()), -f32::INFINITY);
/// assert_eq!(log2(&2u32.into()), 1.0_f32);
/// assert!((log2(&3u32.into()) - 3.0_f32.log2()).abs() <= 0.1);
/// ```
pub fn log2(n: &BigUint) -> f32 {
    if n.is_zero() {
        f32::NEG_INFINITY
    } else {
        ((n.pow(10).bits() - 1) as f64 / 10.) as f32
    }
}

impl Display for ModelCount {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let influence = log2(&self.model_count);
        write!(
            f,
            "Models: {}, Influence {}, Total bits: {}",
            &self.model_count, influence, self.bits,
        )
    }
}
