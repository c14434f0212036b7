use enum_as_inner::EnumAsInner;

use crate::{ir::Var, registers::Register};

use std::fmt;

/// Operand of a target instruction.
///
/// Display forms: `#5` (immediate), `a` (absolute: the memory home of a
/// variable), `R0` (register direct).
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumAsInner)]
pub enum AsmOperand {
  Imm(i64),
  Abs(Var),
  Register(Register),
}

impl AsmOperand {
  pub const fn reg(reg: Register) -> Self {
    Self::Register(reg)
  }

  pub fn is_memory(&self) -> bool {
    self.is_abs()
  }
}

impl fmt::Display for AsmOperand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AsmOperand::Imm(n) => write!(f, "#{}", n),
      AsmOperand::Abs(var) => write!(f, "{}", var),
      AsmOperand::Register(reg) => write!(f, "{}", reg),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_operand_display() {
    assert_eq!(AsmOperand::Imm(1).to_string(), "#1");
    assert_eq!(AsmOperand::reg(Register::new(1)).to_string(), "R1");
    assert_eq!(AsmOperand::Abs(Var::from("a")).to_string(), "a");
    assert!(AsmOperand::Abs(Var::from("a")).is_memory());
    assert!(!AsmOperand::Imm(1).is_memory());
  }
}
