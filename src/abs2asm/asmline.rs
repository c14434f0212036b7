use strum_macros::AsRefStr;

use crate::abs2asm::operand::AsmOperand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AsmOp {
  Add,
  Sub,
  Mul,
  Div,
  Mov,
}

/// Represents one two-address instruction of the target machine: `OP src, dst`.
///
/// The destination is always a register, except for the store form of `MOV`,
/// which writes a register back to a variable's memory home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmLine {
  pub op: AsmOp,
  pub src: AsmOperand,
  pub dst: AsmOperand,
}

impl std::fmt::Display for AsmLine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "\t{} {}, {}", self.op.as_ref(), self.src, self.dst)
  }
}

impl AsmLine {
  fn new(op: AsmOp, src: AsmOperand, dst: AsmOperand) -> Self {
    assert!(!(src.is_memory() && dst.is_memory()));
    assert!(!dst.is_imm());
    Self { op, src, dst }
  }

  /// Load into a register, or store a register to memory.
  pub fn mov(src: &AsmOperand, dst: &AsmOperand) -> Self {
    Self::new(AsmOp::Mov, src.clone(), dst.clone())
  }

  pub fn arith(op: AsmOp, src: &AsmOperand, dst: &AsmOperand) -> Self {
    assert!(op != AsmOp::Mov);
    assert!(dst.is_register());
    Self::new(op, src.clone(), dst.clone())
  }
}
