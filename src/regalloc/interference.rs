use std::collections::HashSet;
use std::fmt;

use crate::{
  ir::{InstrSeq, Var},
  regalloc::{allocation::Coloring, liveness::Liveness},
  utils::Graph,
};

// Represent the interference graph built from a straight-line block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterferenceGraph {
  graph: Graph<Var>,
}

impl InterferenceGraph {
  pub fn new(graph: Graph<Var>) -> Self {
    InterferenceGraph { graph }
  }

  /// Liveness scan followed by graph construction.
  pub fn build(seq: &InstrSeq) -> Self {
    Self::from_liveness(&Liveness::from_seq(seq))
  }

  /// Build the interference graph from the liveness analysis result.
  ///
  /// Nodes are discovered in this order: the live-on-exit variables, then, walking
  /// the block backwards, each destination followed by its variable operands.
  /// A definition interferes with everything live right after it.
  pub fn from_liveness(liveness: &Liveness) -> Self {
    let mut graph = Graph::new();
    for var in liveness.live_on_exit() {
      graph.add_node(var.clone());
    }

    for line in liveness.lines().iter().rev() {
      let def = line.defines();
      graph.add_node(def.clone());
      graph.add_graph_edges(def, line.live_out());

      for var in line.uses() {
        graph.add_node(var.clone());
      }
    }

    let igraph = Self::new(graph);
    debug_assert!(igraph.is_well_formed());
    log::debug!(
      "Interference graph: {} nodes, {} edges, {} live on entry",
      igraph.num_nodes(),
      igraph.graph.num_edges(),
      liveness.live_on_entry().len()
    );
    igraph
  }

  /// Nodes in first-discovery order, the processing order of the colorer.
  pub fn order(&self) -> &[Var] {
    self.graph.nodes()
  }

  pub fn neighbors(&self, node: &Var) -> Option<&HashSet<Var>> {
    self.graph.neighbors(node)
  }

  pub fn contains(&self, node: &Var) -> bool {
    self.graph.contains(node)
  }

  pub fn interferes(&self, a: &Var, b: &Var) -> bool {
    self.graph.has_edge(a, b)
  }

  pub fn num_nodes(&self) -> usize {
    self.graph.num_nodes()
  }

  pub fn edges(&self) -> Vec<(&Var, &Var)> {
    self.graph.edges()
  }

  /// A register is safe for `var` when no neighbor already holds it. Uncolored
  /// neighbors never conflict.
  pub fn is_safe(&self, var: &Var, reg: usize, coloring: &Coloring) -> bool {
    self.neighbors(var).map_or(true, |neighs| {
      neighs.iter().all(|n| coloring.get(n) != Some(reg))
    })
  }

  /// The neighbors of `var`, sorted by name
  pub fn sorted_neighbors(&self, var: &Var) -> Vec<&Var> {
    let mut neighs: Vec<&Var> = self
      .neighbors(var)
      .map(|n| n.iter().collect())
      .unwrap_or_default();
    neighs.sort();
    neighs
  }

  /// Symmetric and free of self-loops
  fn is_well_formed(&self) -> bool {
    self.order().iter().all(|node| {
      self.neighbors(node).map_or(false, |neighs| {
        !neighs.contains(node) && neighs.iter().all(|n| self.interferes(n, node))
      })
    })
  }
}

impl fmt::Display for InterferenceGraph {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Interference Graph:")?;
    for node in self.order() {
      let neighs = self
        .sorted_neighbors(node)
        .iter()
        .map(|n| n.name())
        .collect::<Vec<_>>()
        .join(", ");
      writeln!(f, "  {}: {}", node, neighs)?;
    }
    Ok(())
  }
}
