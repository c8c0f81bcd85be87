use log::trace;
use ndarray::Array1;
use rand::Rng;

use crate::error::Result;
use crate::integrator::{Direction, HamiltonianState, Leapfrog};
use crate::target::Target;

/// Result of expanding a subtree of `2^depth` leapfrog steps.
#[derive(Debug, Clone)]
pub struct Tree {
    // leftmost (backward) state of the subtree
    pub minus: HamiltonianState,
    // rightmost (forward) state of the subtree
    pub plus: HamiltonianState,
    // state sampled uniformly among the in-slice leaves
    pub candidate: HamiltonianState,
    // number of leaves inside the slice
    pub n_in_slice: usize,
    // false once a leaf diverged or a sub-span made a U-turn
    pub continues: bool,
    pub sum_accept: f64,
    pub n_accept: usize,
    pub divergent: bool,
}

impl Tree {
    /// Boundary state to extend from when growing in `direction`.
    pub fn boundary(&self, direction: Direction) -> &HamiltonianState {
        match direction {
            Direction::Backward => &self.minus,
            Direction::Forward => &self.plus,
        }
    }

    pub fn accept_stat(&self) -> f64 {
        if self.n_accept == 0 {
            return 0.;
        }
        self.sum_accept / self.n_accept as f64
    }
}

/// True while the span `minus..plus` has not started doubling back.
pub fn no_u_turn(minus: &HamiltonianState, plus: &HamiltonianState) -> bool {
    let span: Array1<f64> = &plus.position - &minus.position;
    span.dot(&minus.momentum) >= 0. && span.dot(&plus.momentum) >= 0.
}

/// Reservoir merge of two subtrees: the new subtree's candidate replaces the
/// old one with probability `n_new / (n_old + n_new)`.
pub fn select_new_subtree<R: Rng>(rng: &mut R, n_old: usize, n_new: usize) -> bool {
    let total = n_old + n_new;
    total > 0 && rng.gen_range(0.0..1.0) < n_new as f64 / total as f64
}

/// Acceptance of a freshly doubled subtree against the whole trajectory so
/// far, with probability `min(1, n_new / n_old)`.
pub fn accept_new_subtree<R: Rng>(rng: &mut R, n_old: usize, n_new: usize) -> bool {
    if n_old == 0 {
        return n_new > 0;
    }
    let ratio = n_new as f64 / n_old as f64;
    rng.gen_range(0.0..1.0) < ratio.min(1.)
}

/// Recursive binary-doubling trajectory builder for one NUTS iteration.
pub struct TreeBuilder<'a, D: Target, R: Rng> {
    leapfrog: Leapfrog<'a, D>,
    rng: &'a mut R,
    step_size: f64,
    log_slice: f64,
    // Hamiltonian of the initial state
    h0: f64,
    max_delta: f64,
    n_leapfrog: usize,
}

impl<'a, D: Target, R: Rng> TreeBuilder<'a, D, R> {
    pub fn new(
        leapfrog: Leapfrog<'a, D>,
        rng: &'a mut R,
        step_size: f64,
        log_slice: f64,
        h0: f64,
        max_delta: f64,
    ) -> Self {
        Self {
            leapfrog,
            rng,
            step_size,
            log_slice,
            h0,
            max_delta,
            n_leapfrog: 0,
        }
    }

    /// Leapfrog steps taken by this builder so far.
    pub fn n_leapfrog(&self) -> usize {
        self.n_leapfrog
    }

    pub fn rng(&mut self) -> &mut R {
        &mut *self.rng
    }

    /// Build a subtree of `2^depth` leaves starting next to `state` in
    /// `direction`.
    pub fn build(
        &mut self,
        state: &HamiltonianState,
        direction: Direction,
        depth: usize,
    ) -> Result<Tree> {
        if depth == 0 {
            return self.build_leaf(state, direction);
        }
        let mut tree = self.build(state, direction, depth - 1)?;
        if !tree.continues {
            return Ok(tree);
        }

        let other = self.build(tree.boundary(direction), direction, depth - 1)?;
        match direction {
            Direction::Backward => tree.minus = other.minus,
            Direction::Forward => tree.plus = other.plus,
        }
        if select_new_subtree(&mut *self.rng, tree.n_in_slice, other.n_in_slice) {
            tree.candidate = other.candidate;
        }
        tree.sum_accept += other.sum_accept;
        tree.n_accept += other.n_accept;
        tree.n_in_slice += other.n_in_slice;
        tree.divergent |= other.divergent;
        tree.continues = other.continues && no_u_turn(&tree.minus, &tree.plus);
        Ok(tree)
    }

    fn build_leaf(&mut self, state: &HamiltonianState, direction: Direction) -> Result<Tree> {
        let (next, valid) = self
            .leapfrog
            .integrate(state, self.step_size, direction, 1)?;
        self.n_leapfrog += 1;
        let h = if valid {
            next.hamiltonian(self.leapfrog.metric())
        } else {
            f64::INFINITY
        };
        // a NaN energy compares false everywhere below, like +inf
        let n_in_slice = usize::from(self.log_slice <= -h);
        let continues = self.log_slice < self.max_delta - h;
        let divergent = !continues;
        if divergent {
            trace!("divergent leaf: energy {h}, initial energy {}", self.h0);
        }
        let accept = if h.is_nan() {
            0.
        } else {
            (self.h0 - h).min(0.).exp()
        };
        Ok(Tree {
            minus: next.clone(),
            plus: next.clone(),
            candidate: next,
            n_in_slice,
            continues,
            sum_accept: accept,
            n_accept: 1,
            divergent,
        })
    }
}
