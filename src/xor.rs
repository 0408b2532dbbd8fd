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

//! Sparse random XOR constraints for hashing the solution space

use crate::cnf::Var;
use crate::model::Model;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A parity constraint: the variables in `vars` must XOR to `parity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XorConstraint {
    /// Variables included in the parity
    pub vars: Vec<Var>,
    /// Right-hand side of the equation over GF(2)
    pub parity: bool,
}

impl XorConstraint {
    /// whether a total model satisfies this constraint
    pub fn holds_under(&self, model: &Model) -> bool {
        let acc = self
            .vars
            .iter()
            .fold(false, |acc, &v| acc ^ model.value(v));
        acc == self.parity
    }
}

/// Source of random XOR constraints.
///
/// Owns its RNG so that counting runs seeded with [`XorGenerator::seeded`]
/// are reproducible.
pub struct XorGenerator {
    rng: StdRng,
}

impl XorGenerator {
    /// a generator seeded from the operating system
    pub fn new() -> XorGenerator {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// a deterministic generator: equal seeds yield equal constraint streams
    pub fn seeded(seed: u64) -> XorGenerator {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws one sparse XOR over `nvars` variables: each variable is
    /// included independently with probability `density`, and the parity is
    /// uniform. `density` must be within `[0, 1]`.
    pub fn sparse_xor(&mut self, nvars: usize, density: f64) -> XorConstraint {
        let mut vars = Vec::new();
        for i in 0..nvars {
            if self.rng.gen_bool(density) {
                vars.push(Var::from_index(i));
            }
        }
        let parity = self.rng.gen();
        XorConstraint { vars, parity }
    }

    /// Draws `count` independent sparse XORs. The constraints need not be
    /// linearly independent; the GF(2) solver copes with dependencies.
    pub fn family(&mut self, nvars: usize, count: usize, density: f64) -> Vec<XorConstraint> {
        (0..count).map(|_| self.sparse_xor(nvars, density)).collect()
    }
}

impl Default for XorGenerator {
    fn default() -> XorGenerator {
        XorGenerator::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn seeded_generation_is_reproducible() {
        let mut a = XorGenerator::seeded(42);
        let mut b = XorGenerator::seeded(42);
        assert_eq!(a.family(4, 10, 0.5), b.family(4, 10, 0.5));
        // a different seed diverges somewhere in a long enough stream
        let mut c = XorGenerator::seeded(43);
        assert_ne!(a.family(64, 20, 0.5), c.family(64, 20, 0.5));
    }

    #[test]
    fn density_extremes() {
        let mut gen = XorGenerator::seeded(7);
        assert!(gen.sparse_xor(10, 0.0).vars.is_empty());
        let full = gen.sparse_xor(10, 1.0);
        assert_eq!(full.vars.len(), 10);
        assert_eq!(gen.family(10, 0, 0.5).len(), 0);
    }

    #[test]
    fn holds_under_checks_parity() {
        let c = XorConstraint {
            vars: vec![Var::from_index(0), Var::from_index(2)],
            parity: true,
        };
        let mut m = Model::empty(3);
        assert!(!c.holds_under(&m));
        m.set(Var::from_index(0), true);
        assert!(c.holds_under(&m));
        m.set(Var::from_index(2), true);
        assert!(!c.holds_under(&m));
    }
}
