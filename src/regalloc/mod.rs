// The module builds the interference graph from a straight-line block, and performs
// register allocation by backtracking graph coloring
mod allocation;
mod interference;
mod liveness;
mod rename;

pub use allocation::{allocate, Allocation, Coloring};
