// InstrSeq -> backward liveness scan -> Vec<LiveLine>
// Vec<LiveLine> -> build interference graph -> InterferenceGraph

use std::collections::HashSet;

use crate::ir::{Instr, InstrSeq, Var};

/// The liveness information of one instruction in the block.
#[derive(Debug, Clone)]
pub struct LiveLine {
  /// The original instruction
  instr: Instr,
  /// The variable defined in this instruction
  defines: Var,
  /// The variables used in this instruction, in operand order, without duplicates
  uses: Vec<Var>,
  /// The variables live right after this instruction
  live_out: HashSet<Var>,
  /// The variables live right before this instruction
  live_in: HashSet<Var>,
}

impl LiveLine {
  pub fn defines(&self) -> &Var {
    &self.defines
  }

  pub fn uses(&self) -> &[Var] {
    &self.uses
  }

  pub fn live_out(&self) -> &HashSet<Var> {
    &self.live_out
  }

  pub fn live_in(&self) -> &HashSet<Var> {
    &self.live_in
  }
}

/// The liveness analysis result of a straight-line block
#[derive(Debug, Clone)]
pub struct Liveness {
  /// One entry per instruction, in program order
  lines: Vec<LiveLine>,
  /// The variables live after the last instruction, in declaration order
  live_on_exit: Vec<Var>,
  /// The variables live before the first instruction
  live_on_entry: HashSet<Var>,
}

impl Liveness {
  /// Single backward pass over the block. There is no control flow inside a
  /// block, so one pass reaches the fixed point.
  ///
  /// At each instruction the definition is handled before the uses: the
  /// destination leaves the live set, then every variable operand joins it.
  /// For `x = x + y` this leaves `x` live before the instruction.
  pub fn from_seq(seq: &InstrSeq) -> Self {
    let mut live: HashSet<Var> = seq.live_on_exit().iter().cloned().collect();
    let mut lines = Vec::with_capacity(seq.len());

    for instr in seq.instrs().iter().rev() {
      let live_out = live.clone();

      let defines = instr.defined().clone();
      live.remove(&defines);

      let mut uses: Vec<Var> = vec![];
      for var in instr.used() {
        if !uses.contains(var) {
          uses.push(var.clone());
        }
        live.insert(var.clone());
      }

      lines.push(LiveLine {
        instr: instr.clone(),
        defines,
        uses,
        live_out,
        live_in: live.clone(),
      });
    }
    lines.reverse();

    let liveness = Liveness {
      lines,
      live_on_exit: seq.live_on_exit().to_vec(),
      live_on_entry: live,
    };
    liveness.debug_show_livein();
    liveness
  }

  pub fn lines(&self) -> &[LiveLine] {
    &self.lines
  }

  pub fn live_on_exit(&self) -> &[Var] {
    &self.live_on_exit
  }

  /// Variables read before any definition in the block, i.e. values that must
  /// already be present when the block starts.
  pub fn live_on_entry(&self) -> &HashSet<Var> {
    &self.live_on_entry
  }

  fn debug_show_livein(&self) {
    if !log::log_enabled!(log::Level::Trace) {
      return;
    }
    for (idx, line) in self.lines.iter().enumerate() {
      let mut live: Vec<_> = line.live_in().iter().map(Var::name).collect();
      live.sort_unstable();
      log::trace!("Line {}: {}, live-in: {:?}", idx, line.instr, live);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::Operand;

  fn v(name: &str) -> Var {
    Var::from(name)
  }

  fn set(names: &[&str]) -> HashSet<Var> {
    names.iter().map(|n| v(n)).collect()
  }

  fn bin(dest: &str, src1: Operand, op: &str, src2: Operand) -> Instr {
    Instr::from_parts(v(dest), src1, Some(op), Some(src2)).unwrap()
  }

  #[test]
  fn test_straight_line_live_sets() {
    // a = 1; b = 2; c = a + b; live: c
    let seq = InstrSeq::new(
      vec![
        Instr::Mov {
          dest: v("a"),
          src: Operand::Const(1),
        },
        Instr::Mov {
          dest: v("b"),
          src: Operand::Const(2),
        },
        bin("c", v("a").into(), "+", v("b").into()),
      ],
      vec![v("c")],
    );
    let liveness = Liveness::from_seq(&seq);
    let lines = liveness.lines();

    assert_eq!(lines[2].live_out(), &set(&["c"]));
    assert_eq!(lines[2].live_in(), &set(&["a", "b"]));
    assert_eq!(lines[1].live_out(), &set(&["a", "b"]));
    assert_eq!(lines[1].live_in(), &set(&["a"]));
    assert_eq!(lines[0].live_in(), &set(&[]));
    assert!(liveness.live_on_entry().is_empty());
  }

  #[test]
  fn test_self_reference_stays_live() {
    // x = x + 1; live: x
    let seq = InstrSeq::new(
      vec![bin("x", v("x").into(), "+", Operand::Const(1))],
      vec![v("x")],
    );
    let liveness = Liveness::from_seq(&seq);
    let line = &liveness.lines()[0];

    assert_eq!(line.defines(), &v("x"));
    assert_eq!(line.uses(), &[v("x")]);
    assert_eq!(line.live_out(), &set(&["x"]));
    assert_eq!(line.live_in(), &set(&["x"]));
    assert_eq!(liveness.live_on_entry(), &set(&["x"]));
  }

  #[test]
  fn test_repeated_operand_listed_once() {
    let seq = InstrSeq::new(vec![bin("y", v("z").into(), "*", v("z").into())], vec![]);
    let liveness = Liveness::from_seq(&seq);
    assert_eq!(liveness.lines()[0].uses(), &[v("z")]);
    assert_eq!(liveness.live_on_entry(), &set(&["z"]));
  }

  #[test]
  fn test_live_on_exit_untouched_variable_is_live_on_entry() {
    let seq = InstrSeq::new(
      vec![Instr::Mov {
        dest: v("a"),
        src: Operand::Const(4),
      }],
      vec![v("q"), v("a")],
    );
    let liveness = Liveness::from_seq(&seq);
    assert_eq!(liveness.live_on_exit(), &[v("q"), v("a")]);
    assert_eq!(liveness.live_on_entry(), &set(&["q"]));
  }
}
