use std::fmt;

/// A general-purpose register of the target machine, `R0`, `R1`, ...
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash, PartialOrd, Ord)]
pub struct Register(u32);

impl Register {
  pub const fn new(index: u32) -> Self {
    Register(index)
  }
}

impl fmt::Display for Register {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "R{}", self.0)
  }
}
