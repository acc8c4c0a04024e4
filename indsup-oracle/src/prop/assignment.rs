//! Partial assignment and trail.
use partial_ref::{partial, PartialRef};

use indsup_formula::{lit::LitIdx, Lit, Var};

use crate::context::{parts::*, Context};

use super::Reason;

/// Current partial assignment.
#[derive(Default, Clone)]
pub struct Assignment {
    assignment: Vec<Option<bool>>,
    /// Saved phase of each variable, used for decisions.
    last_value: Vec<bool>,
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.assignment.resize(count, None);
        self.last_value.resize(count, false);
    }

    pub fn var_count(&self) -> usize {
        self.assignment.len()
    }

    /// Current partial assignment as slice.
    pub fn assignment(&self) -> &[Option<bool>] {
        &self.assignment
    }

    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.assignment[var.index()]
    }

    /// Value the variable had when it was last assigned.
    pub fn last_var_value(&self, var: Var) -> bool {
        self.last_value[var.index()]
    }

    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.index()].map(|b| b ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_positive())
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_negative())
    }

    pub fn lit_is_unk(&self, lit: Lit) -> bool {
        self.assignment[lit.index()].is_none()
    }

    pub fn assign_lit(&mut self, lit: Lit) {
        self.assignment[lit.index()] = Some(lit.is_positive())
    }

    fn unassign_var(&mut self, var: Var) {
        if let Some(value) = self.assignment[var.index()].take() {
            self.last_value[var.index()] = value;
        }
    }
}

/// Decision and propagation history.
#[derive(Default, Clone)]
pub struct Trail {
    /// Stack of all propagated and all enqueued assignments
    trail: Vec<Lit>,
    /// Next assignment in trail to propagate
    queue_head_pos: usize,
    /// Decision levels as trail indices.
    decisions: Vec<LitIdx>,
}

impl Trail {
    /// Return the next assigned literal to propagate.
    pub fn queue_head(&self) -> Option<Lit> {
        self.trail.get(self.queue_head_pos).cloned()
    }

    pub fn pop_queue(&mut self) {
        self.queue_head_pos += 1;
        debug_assert!(self.queue_head_pos <= self.trail.len());
    }

    /// Assigned literals in assignment order.
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    /// Literals assigned at decision level 0.
    pub fn level_0(&self) -> &[Lit] {
        let end = self
            .decisions
            .first()
            .map_or(self.trail.len(), |&pos| pos as usize);
        &self.trail[..end]
    }

    /// Start a new decision level.
    ///
    /// Does not enqueue the decision itself.
    pub fn new_decision_level(&mut self) {
        self.decisions.push(self.trail.len() as LitIdx)
    }

    /// Current decision level.
    pub fn current_level(&self) -> usize {
        self.decisions.len()
    }
}

/// Enqueues the assignment of true to a literal.
///
/// This updates the assignment and trail, but does not perform any propagation. The literal has to
/// be unassigned when calling this.
pub fn enqueue_assignment(
    mut ctx: partial!(Context, mut AssignmentP, mut ImplGraphP, mut TrailP),
    lit: Lit,
    reason: Reason,
) {
    let assignment = ctx.part_mut(AssignmentP);
    debug_assert!(assignment.lit_value(lit) == None);

    assignment.assign_lit(lit);

    let (trail, mut ctx) = ctx.split_part_mut(TrailP);

    trail.trail.push(lit);

    let node = &mut ctx.part_mut(ImplGraphP).nodes[lit.index()];
    node.reason = reason;
    node.level = trail.decisions.len() as LitIdx;
}

/// Undo all assignments in decision levels deeper than the given level.
///
/// Unassigned variables are made available for decisions again.
pub fn backtrack(
    mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP),
    level: usize,
) {
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (trail, mut ctx) = ctx.split_part_mut(TrailP);

    if level >= trail.decisions.len() {
        return;
    }

    let new_trail_len = trail.decisions[level] as usize;

    trail.queue_head_pos = new_trail_len;
    trail.decisions.truncate(level);

    let vsids = ctx.part_mut(VsidsP);
    for &lit in trail.trail[new_trail_len..].iter() {
        assignment.unassign_var(lit.var());
        vsids.make_available(lit.var());
    }
    trail.trail.truncate(new_trail_len);
}

/// Undo all decisions and assumptions.
pub fn full_restart(mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP)) {
    backtrack(ctx.borrow(), 0);
}
