// The module translates a colored three-address block into target assembly

mod asmline;
mod operand;
mod trans;

pub use asmline::AsmLine;
pub use trans::Translator;

use anyhow::Result;

use crate::regalloc::Allocation;

/// Translate a feasible allocation into target assembly lines.
pub fn translate(alloc: &Allocation) -> Result<Vec<AsmLine>> {
  Translator::from_allocation(alloc)?.translate()
}
