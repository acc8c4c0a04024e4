//! The VSIDS branching heuristic.
//!
//! Each variable carries an activity. Variables occurring in a conflict or resolved on during its
//! analysis are bumped, afterwards all activities decay. Decisions pick the unassigned variable of
//! highest activity.
//!
//! Decaying is done lazily by growing the bump value instead. Once it gets too large every value
//! is scaled down by the same factor, which keeps the order of activities intact.

use ordered_float::OrderedFloat;

use indsup_formula::Var;

use crate::config::OracleConfig;

/// Rescale once a value exceeds this.
const RESCALE_LIMIT: f32 = std::f32::MAX / 16.0;

/// The VSIDS branching heuristic with a max-heap of available variables.
#[derive(Clone)]
pub struct Vsids {
    activity: Vec<OrderedFloat<f32>>,
    heap: Vec<Var>,
    /// Position of each variable in `heap`.
    position: Vec<Option<usize>>,
    bump: f32,
    inv_decay: f32,
}

impl Default for Vsids {
    fn default() -> Vsids {
        Vsids {
            activity: vec![],
            heap: vec![],
            position: vec![],
            bump: 1.0,
            inv_decay: 1.0 / OracleConfig::default().vsids_decay,
        }
    }
}

impl Vsids {
    /// Update structures for a new variable count.
    ///
    /// New variables are available for decisions.
    pub fn set_var_count(&mut self, count: usize) {
        let old_count = self.activity.len();
        self.activity.resize(count, OrderedFloat(0.0));
        self.position.resize(count, None);

        for index in old_count..count {
            self.make_available(Var::from_index(index));
        }
    }

    /// Change the decay factor.
    pub fn set_decay(&mut self, decay: f32) {
        assert!(decay < 1.0);
        assert!(decay > 1.0 / 16.0);
        self.inv_decay = 1.0 / decay;
    }

    pub fn bump(&mut self, var: Var) {
        self.activity[var.index()].0 += self.bump;
        if self.activity[var.index()].0 >= RESCALE_LIMIT {
            self.rescale();
        }
        if let Some(pos) = self.position[var.index()] {
            self.sift_up(pos);
        }
    }

    pub fn decay(&mut self) {
        self.bump *= self.inv_decay;
        if self.bump >= RESCALE_LIMIT {
            self.rescale();
        }
    }

    fn rescale(&mut self) {
        let factor = 1.0 / RESCALE_LIMIT;
        for activity in self.activity.iter_mut() {
            activity.0 *= factor;
        }
        self.bump *= factor;
    }

    /// Insert a variable into the heap if not already present.
    pub fn make_available(&mut self, var: Var) {
        if self.position[var.index()].is_none() {
            let pos = self.heap.len();
            self.heap.push(var);
            self.position[var.index()] = Some(pos);
            self.sift_up(pos);
        }
    }

    fn key(&self, pos: usize) -> OrderedFloat<f32> {
        self.activity[self.heap[pos].index()]
    }

    fn swap_entries(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.position[self.heap[a].index()] = Some(a);
        self.position[self.heap[b].index()] = Some(b);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.key(parent) >= self.key(pos) {
                break;
            }
            self.swap_entries(parent, pos);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let mut largest = pos;
            for child in [pos * 2 + 1, pos * 2 + 2].iter().cloned() {
                if child < self.heap.len() && self.key(child) > self.key(largest) {
                    largest = child;
                }
            }
            if largest == pos {
                break;
            }
            self.swap_entries(largest, pos);
            pos = largest;
        }
    }
}

/// Pops variables in order of decreasing activity.
impl Iterator for Vsids {
    type Item = Var;

    fn next(&mut self) -> Option<Var> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap_entries(0, last);
        let var = self.heap.pop()?;
        self.position[var.index()] = None;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(var)
    }
}
