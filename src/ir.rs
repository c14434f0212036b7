// Register Allocator
//! Three-Address Instruction Type (Triples)

use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use anyhow::{bail, Result};
use enum_as_inner::EnumAsInner;
use serde::Serialize;

/// A variable name, e.g. `a` or `t12`.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Var(pub String);

impl Var {
  pub fn new(name: impl Into<String>) -> Self {
    Var(name.into())
  }

  pub fn name(&self) -> &str {
    &self.0
  }
}

impl From<&str> for Var {
  fn from(name: &str) -> Self {
    Var(name.to_string())
  }
}

impl Display for Var {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{}", self.0)
  }
}

/// Source operand, either a variable or an integer literal.
/// Literals never take part in liveness.
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Operand {
  Const(i64),
  Var(Var),
}

impl Operand {
  /// Classifies a raw token: all digits is a literal, anything else a variable.
  pub fn from_token(token: &str) -> Result<Self> {
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
      match token.parse::<i64>() {
        Ok(n) => Ok(Operand::Const(n)),
        Err(e) => bail!("Literal {} is out of range: {}", token, e),
      }
    } else if token.is_empty() {
      bail!("Empty operand")
    } else {
      Ok(Operand::Var(Var::from(token)))
    }
  }
}

impl From<Var> for Operand {
  fn from(v: Var) -> Self {
    Operand::Var(v)
  }
}

impl Display for Operand {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Operand::Const(n) => write!(f, "{}", n),
      Operand::Var(v) => write!(f, "{}", v),
    }
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
}

impl BinOp {
  pub fn from_symbol(symbol: &str) -> Option<Self> {
    match symbol {
      "+" => Some(BinOp::Add),
      "-" => Some(BinOp::Sub),
      "*" => Some(BinOp::Mul),
      "/" => Some(BinOp::Div),
      _ => None,
    }
  }

  pub fn symbol(&self) -> &'static str {
    match self {
      BinOp::Add => "+",
      BinOp::Sub => "-",
      BinOp::Mul => "*",
      BinOp::Div => "/",
    }
  }

  pub fn is_commutative(&self) -> bool {
    matches!(self, BinOp::Add | BinOp::Mul)
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnOp {
  Neg,
}

impl UnOp {
  pub fn symbol(&self) -> &'static str {
    match self {
      UnOp::Neg => "-",
    }
  }
}

/// Three-address instruction. Each variant is one of the legal shapes,
/// so a constructed `Instr` always satisfies the shape invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instr {
  /// dest = src1 op src2
  BinOp {
    op: BinOp,
    dest: Var,
    src1: Operand,
    src2: Operand,
  },
  /// dest = op src
  UnOp { op: UnOp, dest: Var, src: Operand },
  /// dest = src
  Mov { dest: Var, src: Operand },
}

impl Instr {
  /// Checked constructor from the loose `dest = src1 [op [src2]]` form produced by
  /// the front end. Fails when the parts don't form one of the three shapes.
  pub fn from_parts(
    dest: Var,
    src1: Operand,
    op: Option<&str>,
    src2: Option<Operand>,
  ) -> Result<Self> {
    match (op, src2) {
      (None, None) => Ok(Instr::Mov { dest, src: src1 }),
      (None, Some(src2)) => bail!(
        "Malformed instruction for {}: second operand {} without an operator",
        dest,
        src2
      ),
      (Some("-"), None) => Ok(Instr::UnOp {
        op: UnOp::Neg,
        dest,
        src: src1,
      }),
      (Some(op), None) => bail!(
        "Malformed instruction for {}: operator {} needs a second operand",
        dest,
        op
      ),
      (Some(op), Some(src2)) => match BinOp::from_symbol(op) {
        Some(op) => Ok(Instr::BinOp {
          op,
          dest,
          src1,
          src2,
        }),
        None => bail!("Malformed instruction for {}: unknown operator {}", dest, op),
      },
    }
  }

  /// The variable defined by this instruction.
  pub fn defined(&self) -> &Var {
    match self {
      Instr::BinOp { dest, .. } | Instr::UnOp { dest, .. } | Instr::Mov { dest, .. } => dest,
    }
  }

  /// The variables read by this instruction, left to right. Literals are skipped.
  pub fn used(&self) -> Vec<&Var> {
    let sources = match self {
      Instr::BinOp { src1, src2, .. } => vec![src1, src2],
      Instr::UnOp { src, .. } | Instr::Mov { src, .. } => vec![src],
    };
    sources.into_iter().filter_map(|s| s.as_var()).collect()
  }

  /// Rebuilds the instruction with each use passed through `use_fn` and `def` as
  /// the new destination.
  pub fn map_vars(&self, mut use_fn: impl FnMut(&Var) -> Var, def: Var) -> Self {
    let mut map_operand = |o: &Operand| match o {
      Operand::Var(v) => Operand::Var(use_fn(v)),
      Operand::Const(n) => Operand::Const(*n),
    };
    match self {
      Instr::BinOp { op, src1, src2, .. } => {
        let src1 = map_operand(src1);
        let src2 = map_operand(src2);
        Instr::BinOp {
          op: *op,
          dest: def,
          src1,
          src2,
        }
      }
      Instr::UnOp { op, src, .. } => Instr::UnOp {
        op: *op,
        dest: def,
        src: map_operand(src),
      },
      Instr::Mov { src, .. } => Instr::Mov {
        dest: def,
        src: map_operand(src),
      },
    }
  }
}

impl Display for Instr {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Instr::BinOp {
        op,
        dest,
        src1,
        src2,
      } => write!(f, "{} = {} {} {}", dest, src1, op.symbol(), src2),
      Instr::UnOp { op, dest, src } => write!(f, "{} = {} {}", dest, op.symbol(), src),
      Instr::Mov { dest, src } => write!(f, "{} = {}", dest, src),
    }
  }
}

/// A straight-line block of instructions plus the variables live after it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstrSeq {
  instrs: Vec<Instr>,
  live_on_exit: Vec<Var>,
}

impl InstrSeq {
  pub fn new(instrs: Vec<Instr>, live_on_exit: Vec<Var>) -> Self {
    let mut seq = InstrSeq {
      instrs,
      live_on_exit: vec![],
    };
    seq.set_live_on_exit(live_on_exit);
    seq
  }

  pub fn push(&mut self, instr: Instr) {
    self.instrs.push(instr);
  }

  /// Replaces the live-on-exit list. Duplicates are dropped, first occurrence wins.
  pub fn set_live_on_exit(&mut self, vars: Vec<Var>) {
    let mut seen = HashSet::new();
    self.live_on_exit = vars.into_iter().filter(|v| seen.insert(v.clone())).collect();
  }

  pub fn instrs(&self) -> &[Instr] {
    &self.instrs
  }

  pub fn live_on_exit(&self) -> &[Var] {
    &self.live_on_exit
  }

  pub fn len(&self) -> usize {
    self.instrs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instrs.is_empty()
  }
}

impl Display for InstrSeq {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    writeln!(f, "Three-Address Instruction List:")?;
    for (i, instr) in self.instrs.iter().enumerate() {
      writeln!(f, "  {}: {}", i, instr)?;
    }
    let live = self
      .live_on_exit
      .iter()
      .map(|v| v.name())
      .collect::<Vec<_>>()
      .join(", ");
    writeln!(f, "Live on exit: {}", live)?;
    write!(f, "----------------------------------------")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn var(name: &str) -> Operand {
    Operand::Var(Var::from(name))
  }

  #[test]
  fn test_operand_from_token() {
    assert_eq!(Operand::from_token("12").unwrap(), Operand::Const(12));
    assert_eq!(Operand::from_token("t12").unwrap(), var("t12"));
    assert!(Operand::from_token("").is_err());
    assert!(Operand::from_token("99999999999999999999999").is_err());
  }

  #[test]
  fn test_instr_shapes() {
    let bin = Instr::from_parts(Var::from("x"), var("y"), Some("+"), Some(Operand::Const(1)));
    assert_eq!(bin.unwrap().to_string(), "x = y + 1");

    let neg = Instr::from_parts(Var::from("x"), var("y"), Some("-"), None);
    assert_eq!(neg.unwrap().to_string(), "x = - y");

    let mov = Instr::from_parts(Var::from("x"), Operand::Const(10), None, None);
    assert_eq!(mov.unwrap().to_string(), "x = 10");
  }

  #[test]
  fn test_instr_shape_violations() {
    assert!(Instr::from_parts(Var::from("x"), var("y"), None, Some(var("z"))).is_err());
    assert!(Instr::from_parts(Var::from("x"), var("y"), Some("*"), None).is_err());
    assert!(Instr::from_parts(Var::from("x"), var("y"), Some("%"), Some(var("z"))).is_err());
  }

  #[test]
  fn test_defined_and_used_skip_literals() {
    let instr = Instr::from_parts(Var::from("a"), Operand::Const(3), Some("*"), Some(var("b")))
      .unwrap();
    assert_eq!(instr.defined(), &Var::from("a"));
    assert_eq!(instr.used(), vec![&Var::from("b")]);

    let self_ref =
      Instr::from_parts(Var::from("x"), var("x"), Some("+"), Some(var("x"))).unwrap();
    assert_eq!(self_ref.used(), vec![&Var::from("x"), &Var::from("x")]);
  }

  #[test]
  fn test_seq_live_on_exit_dedup_and_display() {
    let mut seq = InstrSeq::default();
    assert!(seq.is_empty());
    seq.push(Instr::Mov {
      dest: Var::from("a"),
      src: Operand::Const(1),
    });
    seq.push(Instr::Mov {
      dest: Var::from("b"),
      src: Operand::Const(2),
    });
    seq.set_live_on_exit(vec![Var::from("b"), Var::from("a"), Var::from("b")]);
    assert_eq!(seq.live_on_exit(), &[Var::from("b"), Var::from("a")]);
    assert_eq!(
      seq.to_string(),
      "Three-Address Instruction List:\n  0: a = 1\n  1: b = 2\nLive on exit: b, a\n----------------------------------------"
    );
    assert_eq!(seq.len(), 2);
  }
}
