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

//! A CDCL SAT solver: two watched literals, VSIDS branching, first-UIP
//! clause learning, non-chronological backtracking and geometric restarts.

use crate::cnf::{CnfFormula, Lit, Var};
use crate::model::{Model, PartialAssignment};
use tracing::trace;

/// Conflicts before the first restart
const RESTART_INIT: u64 = 100;
/// Growth of the restart interval
const RESTART_FACTOR: f64 = 1.5;
/// VSIDS decay: the increment is divided by this after every conflict
const VSIDS_DECAY: f64 = 0.95;
/// Rescale point for VSIDS activities
const VSIDS_RESCALE: f64 = 1e100;

/// Searches for a model of `formula` extending `hint`.
///
/// Variables bound in the hint are pinned at decision level 0. Returns
/// `None` when no total assignment extending the hint satisfies the
/// formula.
pub fn solve(formula: &CnfFormula, hint: &PartialAssignment) -> Option<Model> {
    Searcher::new(formula, hint).search()
}

/// Search state. Original clauses and learned clauses live in one arena
/// with a single index namespace; originals occupy the low indices.
struct Searcher {
    nvars: usize,
    clauses: Vec<Vec<Lit>>,
    /// watches[l.code()]: indices of clauses currently watching literal l.
    /// Only clauses of size >= 2 are watched; their watched literals sit at
    /// positions 0 and 1.
    watches: Vec<Vec<usize>>,
    values: Vec<Option<bool>>,
    levels: Vec<usize>,
    reasons: Vec<Option<usize>>,
    trail: Vec<Lit>,
    /// trail length at the opening of each decision level
    trail_lim: Vec<usize>,
    /// next trail position to propagate
    head: usize,
    activity: Vec<f64>,
    vsids_inc: f64,
    conflicts: u64,
    restart_limit: u64,
    seen: Vec<bool>,
}

impl Searcher {
    fn new(formula: &CnfFormula, hint: &PartialAssignment) -> Searcher {
        let nvars = formula.var_count();
        let clauses: Vec<Vec<Lit>> = formula.iter().map(|c| c.to_vec()).collect();
        let mut searcher = Searcher {
            nvars,
            watches: vec![Vec::new(); 2 * nvars],
            values: vec![None; nvars],
            levels: vec![0; nvars],
            reasons: vec![None; nvars],
            trail: Vec::with_capacity(nvars),
            trail_lim: Vec::new(),
            head: 0,
            activity: vec![0.0; nvars],
            vsids_inc: 1.0,
            conflicts: 0,
            restart_limit: RESTART_INIT,
            seen: vec![false; nvars],
            clauses,
        };
        for ci in 0..searcher.clauses.len() {
            searcher.watch_clause(ci);
        }
        for (var, value) in hint.iter_assigned() {
            if var.index() < nvars && searcher.values[var.index()].is_none() {
                searcher.assign(Lit::from_var(var, value), None);
            }
        }
        searcher
    }

    fn watch_clause(&mut self, ci: usize) {
        if self.clauses[ci].len() >= 2 {
            let w0 = self.clauses[ci][0];
            let w1 = self.clauses[ci][1];
            self.watches[w0.code()].push(ci);
            self.watches[w1.code()].push(ci);
        }
    }

    fn decision_level(&self) -> usize {
        self.trail_lim.len()
    }

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.values[lit.var().index()].map(|v| v ^ lit.is_negative())
    }

    /// Makes `lit` true at the current decision level.
    fn assign(&mut self, lit: Lit, reason: Option<usize>) {
        let v = lit.var().index();
        debug_assert!(self.values[v].is_none());
        self.values[v] = Some(lit.is_positive());
        self.levels[v] = self.decision_level();
        self.reasons[v] = reason;
        self.trail.push(lit);
    }

    /// Scans every clause for pending units under the current assignment,
    /// binding them at the current level. Returns a conflicting clause if
    /// one is already falsified. Used before the first propagation and
    /// after restarts, where no single new assignment drives the watches.
    fn seed_units(&mut self) -> Option<usize> {
        for ci in 0..self.clauses.len() {
            let mut unassigned = None;
            let mut unassigned_count = 0;
            let mut satisfied = false;
            for &lit in &self.clauses[ci] {
                match self.lit_value(lit) {
                    Some(true) => {
                        satisfied = true;
                        break;
                    }
                    Some(false) => {}
                    None => {
                        unassigned = Some(lit);
                        unassigned_count += 1;
                    }
                }
            }
            if satisfied {
                continue;
            }
            match (unassigned, unassigned_count) {
                (None, _) => return Some(ci),
                (Some(lit), 1) => self.assign(lit, Some(ci)),
                _ => {}
            }
        }
        None
    }

    /// Propagates all queued assignments to fixpoint through the watch
    /// lists. Returns the index of a conflicting clause, if any.
    fn propagate(&mut self) -> Option<usize> {
        while self.head < self.trail.len() {
            let lit = self.trail[self.head];
            self.head += 1;
            let false_lit = !lit;
            let mut watch_list = std::mem::take(&mut self.watches[false_lit.code()]);
            let mut i = 0;
            'clauses: while i < watch_list.len() {
                let ci = watch_list[i];
                // normalize: the falsified watch goes to position 1
                if self.clauses[ci][0] == false_lit {
                    self.clauses[ci].swap(0, 1);
                }
                let other = self.clauses[ci][0];
                if self.lit_value(other) == Some(true) {
                    i += 1;
                    continue;
                }
                // look for a non-false literal to watch instead
                for k in 2..self.clauses[ci].len() {
                    let candidate = self.clauses[ci][k];
                    if self.lit_value(candidate) != Some(false) {
                        self.clauses[ci].swap(1, k);
                        self.watches[candidate.code()].push(ci);
                        watch_list.swap_remove(i);
                        continue 'clauses;
                    }
                }
                // the whole clause except `other` is false
                match self.lit_value(other) {
                    None => {
                        self.assign(other, Some(ci));
                        i += 1;
                    }
                    Some(false) => {
                        self.watches[false_lit.code()] = watch_list;
                        return Some(ci);
                    }
                    Some(true) => {
                        i += 1;
                    }
                }
            }
            self.watches[false_lit.code()] = watch_list;
        }
        None
    }

    fn bump(&mut self, var: Var) {
        self.activity[var.index()] += self.vsids_inc;
        if self.activity[var.index()] > VSIDS_RESCALE {
            for a in self.activity.iter_mut() {
                *a /= VSIDS_RESCALE;
            }
            self.vsids_inc /= VSIDS_RESCALE;
        }
    }

    fn decay(&mut self) {
        self.vsids_inc /= VSIDS_DECAY;
    }

    /// First-UIP conflict analysis: resolves the conflicting clause against
    /// the antecedents of literals assigned at the conflict level until a
    /// single literal of that level remains. Returns the learned clause,
    /// asserting literal first, and the level to backtrack to.
    fn analyze(&mut self, conflict: usize) -> (Vec<Lit>, usize) {
        let conflict_level = self.decision_level();
        let mut learnt: Vec<Lit> = vec![self.clauses[conflict][0]];
        let mut at_conflict_level = 0usize;
        let mut clause = conflict;
        let mut resolving: Option<Lit> = None;
        let mut index = self.trail.len();
        loop {
            for j in 0..self.clauses[clause].len() {
                let q = self.clauses[clause][j];
                if resolving == Some(q) {
                    continue;
                }
                let v = q.var().index();
                if !self.seen[v] && self.levels[v] > 0 {
                    self.seen[v] = true;
                    self.bump(q.var());
                    if self.levels[v] >= conflict_level {
                        at_conflict_level += 1;
                    } else {
                        learnt.push(q);
                    }
                }
            }
            // next conflict-level literal in the cut, walking the trail down
            loop {
                index -= 1;
                if self.seen[self.trail[index].var().index()] {
                    break;
                }
            }
            let pivot = self.trail[index];
            self.seen[pivot.var().index()] = false;
            at_conflict_level -= 1;
            if at_conflict_level == 0 {
                learnt[0] = !pivot;
                break;
            }
            clause = self.reasons[pivot.var().index()].expect("implied literal has an antecedent");
            resolving = Some(pivot);
        }
        for &lit in &learnt[1..] {
            self.seen[lit.var().index()] = false;
        }
        // backtrack to the second highest level in the clause; keep a
        // literal of that level in a watched position
        let backtrack_level = if learnt.len() == 1 {
            0
        } else {
            let mut deepest = 1;
            for i in 2..learnt.len() {
                if self.levels[learnt[i].var().index()] > self.levels[learnt[deepest].var().index()] {
                    deepest = i;
                }
            }
            learnt.swap(1, deepest);
            self.levels[learnt[1].var().index()]
        };
        (learnt, backtrack_level)
    }

    /// Unassigns everything above `level`.
    fn backtrack(&mut self, level: usize) {
        if level >= self.decision_level() {
            return;
        }
        let target = self.trail_lim[level];
        for &lit in &self.trail[target..] {
            let v = lit.var().index();
            self.values[v] = None;
            self.reasons[v] = None;
        }
        self.trail.truncate(target);
        self.trail_lim.truncate(level);
        self.head = target;
    }

    /// Appends a learned clause to the arena and asserts its first literal.
    fn learn(&mut self, learnt: Vec<Lit>) {
        let ci = self.clauses.len();
        trace!(size = learnt.len(), index = ci, "learned clause");
        self.clauses.push(learnt);
        self.watch_clause(ci);
        let asserting = self.clauses[ci][0];
        self.assign(asserting, Some(ci));
    }

    fn restart(&mut self) {
        trace!(conflicts = self.conflicts, limit = self.restart_limit, "restart");
        self.backtrack(0);
        self.conflicts = 0;
        self.restart_limit = (self.restart_limit as f64 * RESTART_FACTOR) as u64;
    }

    /// Opens a new decision level on the unassigned variable with the
    /// highest activity, ties to the lowest index. Decisions are always
    /// positive.
    fn decide(&mut self) {
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for v in 0..self.nvars {
            if self.values[v].is_none() && self.activity[v] > best_score {
                best = v;
                best_score = self.activity[v];
            }
        }
        self.trail_lim.push(self.trail.len());
        self.assign(Lit::positive(Var::from_index(best)), None);
    }

    fn model(&self) -> Model {
        let mut model = Model::empty(self.nvars);
        for (v, value) in self.values.iter().enumerate() {
            if *value == Some(true) {
                model.0.insert(v);
            }
        }
        model
    }

    fn search(&mut self) -> Option<Model> {
        if self.seed_units().is_some() {
            return None;
        }
        loop {
            if let Some(conflict) = self.propagate() {
                if self.decision_level() == 0 {
                    return None;
                }
                let (learnt, level) = self.analyze(conflict);
                self.backtrack(level);
                self.learn(learnt);
                self.decay();
                self.conflicts += 1;
                if self.conflicts >= self.restart_limit {
                    self.restart();
                    if self.seed_units().is_some() {
                        return None;
                    }
                }
            } else if self.trail.len() == self.nvars {
                return Some(self.model());
            } else {
                self.decide();
            }
        }
    }
}
