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

//! Total models and partial assignments

use crate::cnf::{CnfFormula, Lit, Var};
use fixedbitset::FixedBitSet;

/// Represents a total model by the set of true variables
#[derive(Clone, PartialOrd, Ord, PartialEq, Eq)]
pub struct Model(pub FixedBitSet);

impl std::fmt::Debug for Model {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_set()
            .entries(self.0.ones().map(Var::from_index))
            .finish()
    }
}

impl Model {
    /// creates a model for a formula of `nvars` variables with all variables false
    pub fn empty(nvars: usize) -> Model {
        Self(FixedBitSet::with_capacity(nvars))
    }

    /// number of variables for the whole formula
    pub fn nvars(&self) -> usize {
        self.0.len()
    }

    /// set the specified variable to the specified value
    pub fn set(&mut self, var: Var, value: bool) {
        self.0.set(var.index(), value)
    }

    /// value of the specified variable
    pub fn value(&self, var: Var) -> bool {
        self.0.contains(var.index())
    }

    /// whether the literal is true under this model
    pub fn lit(&self, literal: Lit) -> bool {
        self.value(literal.var()) ^ literal.is_negative()
    }

    /// The clause ruling out exactly this model, for solution enumeration.
    pub fn blocking_clause(&self) -> Vec<Lit> {
        (0..self.nvars())
            .map(|i| {
                let v = Var::from_index(i);
                Lit::from_var(v, !self.value(v))
            })
            .collect()
    }

    /// returns the first model to iterate over all possible models with `next_model`
    pub fn first_model(nvars: usize) -> Model {
        Model::empty(nvars)
    }

    /// modifies a model in place to get to the next one, treating the
    /// variable set as a binary counter with variable 1 as the low bit.
    /// Returns whether there are further models.
    pub fn next_model(&mut self) -> bool {
        for i in 0..self.0.len() {
            if self.0.contains(i) {
                self.0.set(i, false);
            } else {
                self.0.insert(i);
                return true;
            }
        }
        false
    }

    /// Checks whether the model satisfies a formula.
    pub fn satisfies(&self, formula: &CnfFormula) -> bool {
        formula
            .iter()
            .all(|clause| clause.iter().any(|&lit| self.lit(lit)))
    }
}

/// A partial assignment: some variables mapped to a value, the rest free.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialAssignment(Vec<Option<bool>>);

impl PartialAssignment {
    /// creates an assignment over `nvars` variables with every variable free
    pub fn new(nvars: usize) -> PartialAssignment {
        Self(vec![None; nvars])
    }

    /// number of variables, free or not
    pub fn nvars(&self) -> usize {
        self.0.len()
    }

    /// value of a variable, `None` when free or out of range
    pub fn value(&self, var: Var) -> Option<bool> {
        self.0.get(var.index()).copied().flatten()
    }

    /// value of a literal, `None` when its variable is free or out of range
    pub fn lit_value(&self, literal: Lit) -> Option<bool> {
        self.value(literal.var()).map(|v| v ^ literal.is_negative())
    }

    /// binds a variable
    pub fn assign(&mut self, var: Var, value: bool) {
        self.0[var.index()] = Some(value);
    }

    /// number of bound variables
    pub fn assigned_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    /// number of free variables
    pub fn free_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_none()).count()
    }

    /// iterates over the bound variables and their values
    pub fn iter_assigned(&self) -> impl Iterator<Item = (Var, bool)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|value| (Var::from_index(i), value)))
    }
}

#[test]
fn test_satisfies() -> anyhow::Result<()> {
    let f = b"p cnf 3 3
-1 3 -2 0
-2 1 3 0
3 -1 -2 0
";
    let formula = varisat_dimacs::DimacsParser::parse(f as &[u8])?;
    let mut model = Model::empty(3);
    assert!(model.satisfies(&formula));
    model.0.insert(0);
    model.0.insert(1);
    assert!(!model.satisfies(&formula));
    model.0.insert(2);
    assert!(model.satisfies(&formula));
    Ok(())
}

#[test]
fn test_next_model() {
    // all models of 2 variables, in binary counter order
    let mut m = Model::first_model(2);
    let mut seen = Vec::new();
    loop {
        seen.push((m.value(Var::from_index(0)), m.value(Var::from_index(1))));
        if !m.next_model() {
            break;
        }
    }
    assert_eq!(
        seen,
        vec![(false, false), (true, false), (false, true), (true, true)]
    );
    // a model over 0 variables has no successor
    let mut m = Model::first_model(0);
    assert!(!m.next_model());
}

#[test]
fn test_blocking_clause() {
    let mut m = Model::empty(3);
    m.set(Var::from_index(1), true);
    let clause = m.blocking_clause();
    assert_eq!(clause.len(), 3);
    // every literal of the blocking clause is false under the blocked model
    assert!(clause.iter().all(|&lit| !m.lit(lit)));
}

#[test]
fn test_partial_assignment() {
    let mut a = PartialAssignment::new(3);
    assert_eq!(a.free_count(), 3);
    a.assign(Var::from_index(1), false);
    assert_eq!(a.assigned_count(), 1);
    assert_eq!(a.value(Var::from_index(1)), Some(false));
    assert_eq!(a.value(Var::from_index(0)), None);
    assert_eq!(a.lit_value(Lit::from_dimacs(-2)), Some(true));
    assert_eq!(a.lit_value(Lit::from_dimacs(2)), Some(false));
    assert_eq!(a.lit_value(Lit::from_dimacs(3)), None);
    assert_eq!(a.iter_assigned().collect::<Vec<_>>(), vec![(Var::from_index(1), false)]);
}
