use std::collections::HashSet;

use anyhow::{anyhow, bail, Result};

use crate::{
  abs2asm::{
    asmline::{AsmLine, AsmOp},
    operand::AsmOperand,
  },
  ir::{BinOp, Instr, Operand, UnOp, Var},
  regalloc::{Allocation, Coloring},
  registers::{reg_from_color, Register},
};

/// Translates a colored block into target assembly.
pub struct Translator<'a> {
  alloc: &'a Allocation,
  coloring: &'a Coloring,
  /// Variables whose current value sits in their register. A variable that is
  /// read before this block defines it still lives in its memory home.
  in_register: HashSet<&'a Var>,
  lines: Vec<AsmLine>,
}

impl<'a> Translator<'a> {
  pub fn from_allocation(alloc: &'a Allocation) -> Result<Self> {
    let coloring = alloc.coloring.as_ref().ok_or_else(|| {
      anyhow!(
        "Cannot translate: block is not colorable with {} registers",
        alloc.num_regs
      )
    })?;
    Ok(Translator {
      alloc,
      coloring,
      in_register: HashSet::new(),
      lines: vec![],
    })
  }

  /// Translate the whole block: one group of lines per instruction, then the
  /// stores of every live-on-exit variable the block defined.
  pub fn translate(mut self) -> Result<Vec<AsmLine>> {
    let alloc = self.alloc;
    for instr in alloc.seq.instrs() {
      self.munch_instr(instr)?;
    }

    for var in alloc.seq.live_on_exit() {
      if self.in_register.contains(var) {
        let reg = AsmOperand::reg(self.reg_of(var)?);
        let home = AsmOperand::Abs(alloc.home_of(var).clone());
        self.lines.push(AsmLine::mov(&reg, &home));
      }
    }

    Ok(self.lines)
  }

  fn munch_instr(&mut self, instr: &'a Instr) -> Result<()> {
    match instr {
      Instr::Mov { dest, src } => {
        let rd = AsmOperand::reg(self.reg_of(dest)?);
        let src = self.operand(src)?;
        if src != rd {
          self.lines.push(AsmLine::mov(&src, &rd));
        }
      }
      Instr::BinOp {
        op,
        dest,
        src1,
        src2,
      } => {
        let src1 = self.operand(src1)?;
        let src2_var = src2.as_var();
        let src2 = self.operand(src2)?;
        self.munch_binop(Self::asm_op(*op), op.is_commutative(), dest, src1, src2, src2_var)?;
      }
      Instr::UnOp { op, dest, src } => match op {
        // d = - s  ==>  d = 0 - s
        UnOp::Neg => {
          let src_var = src.as_var();
          let src = self.operand(src)?;
          self.munch_binop(AsmOp::Sub, false, dest, AsmOperand::Imm(0), src, src_var)?;
        }
      },
    }
    self.in_register.insert(instr.defined());
    Ok(())
  }

  /// `dest = src1 op src2` as `MOV src1, Rd` followed by `OP src2, Rd`.
  ///
  /// When src2 already occupies Rd the first move would clobber it: commutative
  /// ops swap their operands, the others first park src2 in its memory home.
  fn munch_binop(
    &mut self,
    op: AsmOp,
    commutative: bool,
    dest: &Var,
    mut src1: AsmOperand,
    mut src2: AsmOperand,
    src2_var: Option<&Var>,
  ) -> Result<()> {
    let rd = AsmOperand::reg(self.reg_of(dest)?);

    if src2 == rd && src1 != rd {
      if commutative {
        std::mem::swap(&mut src1, &mut src2);
      } else {
        let var = match src2_var {
          Some(var) => var,
          None => bail!("Operand {} of {} is in a register but is not a variable", src2, dest),
        };
        let home = AsmOperand::Abs(self.alloc.home_of(var).clone());
        self.lines.push(AsmLine::mov(&rd, &home));
        src2 = home;
      }
    }

    if src1 != rd {
      self.lines.push(AsmLine::mov(&src1, &rd));
    }
    self.lines.push(AsmLine::arith(op, &src2, &rd));
    Ok(())
  }

  fn operand(&self, operand: &Operand) -> Result<AsmOperand> {
    match operand {
      Operand::Const(n) => Ok(AsmOperand::Imm(*n)),
      Operand::Var(var) if self.in_register.contains(var) => Ok(AsmOperand::reg(self.reg_of(var)?)),
      Operand::Var(var) => Ok(AsmOperand::Abs(self.alloc.home_of(var).clone())),
    }
  }

  fn reg_of(&self, var: &Var) -> Result<Register> {
    self
      .coloring
      .get(var)
      .map(reg_from_color)
      .ok_or_else(|| anyhow!("Variable {} has no register", var))
  }

  fn asm_op(op: BinOp) -> AsmOp {
    match op {
      BinOp::Add => AsmOp::Add,
      BinOp::Sub => AsmOp::Sub,
      BinOp::Mul => AsmOp::Mul,
      BinOp::Div => AsmOp::Div,
    }
  }
}
