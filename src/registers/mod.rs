pub(crate) mod reg;

pub use reg::Register;

/// Colors are handed out as `0..k`, and color `i` lives in register `Ri`.
pub fn reg_from_color(color: usize) -> Register {
  Register::new(color as u32)
}
