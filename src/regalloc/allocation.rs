use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use serde::Serialize;

use crate::{
  args::AllocOptions,
  ir::{InstrSeq, Var},
  regalloc::{interference::InterferenceGraph, rename::Renamed},
};

/// Register index assigned to each variable, `0..k`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Coloring(HashMap<Var, usize>);

impl Coloring {
  pub fn get(&self, var: &Var) -> Option<usize> {
    self.0.get(var).copied()
  }

  pub fn assign(&mut self, var: Var, reg: usize) {
    self.0.insert(var, reg);
  }

  pub fn unassign(&mut self, var: &Var) {
    self.0.remove(var);
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Var, &usize)> {
    self.0.iter()
  }

  /// Number of distinct registers actually handed out
  pub fn num_registers_used(&self) -> usize {
    self.0.values().collect::<HashSet<_>>().len()
  }

  /// Every node colored within `0..k`, and no edge joins two equal colors.
  pub fn is_valid_for(&self, igraph: &InterferenceGraph, k: usize) -> bool {
    let total = igraph
      .order()
      .iter()
      .all(|v| self.get(v).map_or(false, |c| c < k));
    total
      && self.len() == igraph.num_nodes()
      && igraph
        .edges()
        .into_iter()
        .all(|(a, b)| self.get(a) != self.get(b))
  }
}

/// The backtracking colorer. There is one allocator per coloring attempt; the
/// coloring map is the only mutable state and is undone on every failed branch.
pub struct Allocator<'a> {
  igraph: &'a InterferenceGraph,
  /// The number of available registers
  num_regs: usize,
  /// The partial coloring explored so far
  coloring: Coloring,
  /// Tentative assignments made so far
  steps: u64,
  step_limit: Option<u64>,
  backtracks: u64,
}

impl<'a> Allocator<'a> {
  pub fn new(igraph: &'a InterferenceGraph, num_regs: usize) -> Self {
    Allocator {
      igraph,
      num_regs,
      coloring: Coloring::default(),
      steps: 0,
      step_limit: None,
      backtracks: 0,
    }
  }

  pub fn with_step_limit(mut self, step_limit: Option<u64>) -> Self {
    self.step_limit = step_limit;
    self
  }

  /// Colors the graph visiting nodes in `order`.
  ///
  /// # Returns
  ///
  /// `Ok(Some(coloring))` with the first complete coloring found,
  /// `Ok(None)` when no coloring exists with `num_regs` registers,
  /// `Err` when the inputs break the contract or the step limit is hit.
  pub fn color(mut self, order: &[Var]) -> Result<Option<Coloring>> {
    if self.num_regs == 0 {
      bail!("Number of registers must be positive, got 0");
    }
    self.check_order(order)?;

    let found = self.try_color(order)?;
    log::debug!(
      "Coloring with {} registers: {} after {} steps, {} backtracks",
      self.num_regs,
      if found { "found" } else { "infeasible" },
      self.steps,
      self.backtracks
    );

    if found {
      debug_assert!(self.coloring.is_valid_for(self.igraph, self.num_regs));
      Ok(Some(self.coloring))
    } else {
      Ok(None)
    }
  }

  /// Depth-first search over `order`, kept on an explicit stack so the depth is
  /// bounded by the heap rather than the thread stack.
  ///
  /// `next[d]` is the first register not yet tried for `order[d]`. Registers are
  /// tried in ascending order; when a node runs out of registers it is popped and
  /// its parent's assignment is undone before the parent tries its next one.
  fn try_color(&mut self, order: &[Var]) -> Result<bool> {
    let mut next: Vec<usize> = Vec::with_capacity(order.len() + 1);
    next.push(0);

    while let Some(depth) = next.len().checked_sub(1) {
      let var = match order.get(depth) {
        None => return Ok(true),
        Some(var) => var,
      };

      let igraph = self.igraph;
      let coloring = &self.coloring;
      let found = (next[depth]..self.num_regs).find(|&reg| igraph.is_safe(var, reg, coloring));

      match found {
        Some(reg) => {
          self.steps += 1;
          if let Some(limit) = self.step_limit {
            if self.steps > limit {
              bail!(
                "Register search gave up after {} steps with {} registers",
                limit,
                self.num_regs
              );
            }
          }

          log::trace!("try {} := R{}", var, reg);
          self.coloring.assign(var.clone(), reg);
          next[depth] = reg + 1;
          next.push(0);
        }
        None => {
          next.pop();
          if let Some(parent) = depth.checked_sub(1) {
            self.coloring.unassign(&order[parent]);
            self.backtracks += 1;
          }
        }
      }
    }

    Ok(false)
  }

  /// `order` must list every node of the graph exactly once.
  fn check_order(&self, order: &[Var]) -> Result<()> {
    let mut seen = HashSet::new();
    for var in order {
      if !self.igraph.contains(var) {
        bail!("Variable {} in coloring order is not in the interference graph", var);
      }
      if !seen.insert(var) {
        bail!("Variable {} appears twice in coloring order", var);
      }
    }
    if seen.len() != self.igraph.num_nodes() {
      bail!(
        "Coloring order covers {} of {} variables",
        seen.len(),
        self.igraph.num_nodes()
      );
    }
    Ok(())
  }
}

/// Result of running the whole allocation pipeline on one block.
#[derive(Debug, Clone)]
pub struct Allocation {
  /// The block the graph was built from, renamed if renaming was enabled
  pub seq: InstrSeq,
  pub igraph: InterferenceGraph,
  /// `None` means the block is not colorable with `num_regs` registers
  pub coloring: Option<Coloring>,
  pub num_regs: usize,
  /// Versioned name -> original name, when renaming was applied
  pub origin: HashMap<Var, Var>,
}

impl Allocation {
  pub fn is_feasible(&self) -> bool {
    self.coloring.is_some()
  }

  /// The memory home of a variable: its name before renaming.
  pub fn home_of<'v>(&'v self, var: &'v Var) -> &'v Var {
    self.origin.get(var).unwrap_or(var)
  }
}

/// Optional renaming -> interference graph -> backtracking coloring.
pub fn allocate(seq: &InstrSeq, num_regs: usize, options: &AllocOptions) -> Result<Allocation> {
  let (seq, origin) = if options.ssa_rename {
    let Renamed { seq, origin } = Renamed::from_seq(seq);
    (seq, origin)
  } else {
    (seq.clone(), HashMap::new())
  };

  let igraph = InterferenceGraph::build(&seq);
  let coloring = Allocator::new(&igraph, num_regs)
    .with_step_limit(options.step_limit)
    .color(igraph.order())?;

  Ok(Allocation {
    seq,
    igraph,
    coloring,
    num_regs,
    origin,
  })
}
