//! Renames every definition to a fresh versioned name, so that each live range,
//! rather than each variable name, becomes its own node in the interference graph.
use std::collections::HashMap;

use crate::ir::{InstrSeq, Var};

/// A renamed block together with the way back to the original names.
#[derive(Debug, Clone)]
pub struct Renamed {
  /// Every variable in here is defined at most once
  pub seq: InstrSeq,
  /// Versioned name -> original name
  pub origin: HashMap<Var, Var>,
}

impl Renamed {
  /// Forward pass. The n-th definition of `a` becomes `a.n`; each use reads the
  /// latest version. Reads that come before any definition keep the original
  /// name, since they refer to the value the block starts with.
  pub fn from_seq(seq: &InstrSeq) -> Self {
    let mut current: HashMap<Var, Var> = HashMap::new();
    let mut counters: HashMap<Var, u32> = HashMap::new();
    let mut origin = HashMap::new();
    let mut instrs = Vec::with_capacity(seq.len());

    for instr in seq.instrs() {
      let dest = instr.defined();
      let count = counters.entry(dest.clone()).or_insert(0);
      *count += 1;
      let version = Var::new(format!("{}.{}", dest, count));

      // sources are rewritten against the versions live before this definition
      let renamed = instr.map_vars(
        |u| current.get(u).cloned().unwrap_or_else(|| u.clone()),
        version.clone(),
      );
      instrs.push(renamed);

      origin.insert(version.clone(), dest.clone());
      current.insert(dest.clone(), version);
    }

    let live_on_exit = seq
      .live_on_exit()
      .iter()
      .map(|v| current.get(v).cloned().unwrap_or_else(|| v.clone()))
      .collect();

    log::debug!("Renamed {} definitions", origin.len());
    Renamed {
      seq: InstrSeq::new(instrs, live_on_exit),
      origin,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::{Instr, Operand};
  use crate::regalloc::{allocation::Allocator, interference::InterferenceGraph};
  use std::collections::HashSet;

  fn v(name: &str) -> Var {
    Var::from(name)
  }

  fn mov(dest: &str, src: Operand) -> Instr {
    Instr::Mov { dest: v(dest), src }
  }

  fn bin(dest: &str, src1: Operand, op: &str, src2: Operand) -> Instr {
    Instr::from_parts(v(dest), src1, Some(op), Some(src2)).unwrap()
  }

  #[test]
  fn test_each_variable_defined_once() {
    // x = x + 1; x = x * 2; y = x; live: x, y
    let seq = InstrSeq::new(
      vec![
        bin("x", v("x").into(), "+", Operand::Const(1)),
        bin("x", v("x").into(), "*", Operand::Const(2)),
        mov("y", v("x").into()),
      ],
      vec![v("x"), v("y")],
    );
    let renamed = Renamed::from_seq(&seq);

    let texts: Vec<String> = renamed.seq.instrs().iter().map(|i| i.to_string()).collect();
    assert_eq!(texts, vec!["x.1 = x + 1", "x.2 = x.1 * 2", "y.1 = x.2"]);
    assert_eq!(renamed.seq.live_on_exit(), &[v("x.2"), v("y.1")]);

    let mut defined = HashSet::new();
    for instr in renamed.seq.instrs() {
      assert!(defined.insert(instr.defined().clone()));
    }
    assert_eq!(renamed.origin.get(&v("x.2")), Some(&v("x")));
    assert_eq!(renamed.origin.get(&v("x")), None);
  }

  #[test]
  fn test_live_on_exit_without_definition_is_kept() {
    let seq = InstrSeq::new(vec![mov("a", Operand::Const(1))], vec![v("q")]);
    let renamed = Renamed::from_seq(&seq);
    assert_eq!(renamed.seq.live_on_exit(), &[v("q")]);
  }

  #[test]
  fn test_renaming_splits_live_ranges() {
    // x = 1; a = x + 1; y = a + 1; a = x + y; z = a + y; live: z
    //
    // Both definitions of `a` share one node without renaming, which closes the
    // triangle a-x-y. Renamed, a.1 only meets x.1 and a.2 only meets y.1.
    let seq = InstrSeq::new(
      vec![
        mov("x", Operand::Const(1)),
        bin("a", v("x").into(), "+", Operand::Const(1)),
        bin("y", v("a").into(), "+", Operand::Const(1)),
        bin("a", v("x").into(), "+", v("y").into()),
        bin("z", v("a").into(), "+", v("y").into()),
      ],
      vec![v("z")],
    );

    let plain = InterferenceGraph::build(&seq);
    assert!(plain.interferes(&v("a"), &v("x")));
    assert!(plain.interferes(&v("a"), &v("y")));
    assert!(plain.interferes(&v("x"), &v("y")));
    assert!(Allocator::new(&plain, 2).color(plain.order()).unwrap().is_none());
    assert!(Allocator::new(&plain, 3).color(plain.order()).unwrap().is_some());

    let renamed = Renamed::from_seq(&seq);
    let igraph = InterferenceGraph::build(&renamed.seq);
    assert!(igraph.interferes(&v("a.1"), &v("x.1")));
    assert!(!igraph.interferes(&v("a.1"), &v("y.1")));
    assert!(igraph.interferes(&v("a.2"), &v("y.1")));
    assert!(!igraph.interferes(&v("a.2"), &v("x.1")));
    assert_eq!(igraph.num_nodes(), plain.num_nodes() + 1);

    let coloring = Allocator::new(&igraph, 2).color(igraph.order()).unwrap().unwrap();
    assert!(coloring.is_valid_for(&igraph, 2));
  }
}
