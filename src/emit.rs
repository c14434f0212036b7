// Register Allocator
//! Output emission

use std::collections::BTreeMap;
use std::fs::File;
use std::io::prelude::*;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::abs2asm::{self, AsmLine};
use crate::regalloc::Allocation;

/// Keys and neighbor lists are sorted so the output is stable.
#[derive(Serialize)]
struct JsonAllocation<'a> {
  coloring: BTreeMap<&'a str, usize>,
  graph: BTreeMap<&'a str, Vec<&'a str>>,
  num_registers: usize,
}

/// Return the target assembly as a string, one instruction per line.
pub fn return_asm(lines: &[AsmLine]) -> String {
  let mut asm = String::new();
  for line in lines {
    asm.push_str(&line.to_string());
    asm.push('\n');
  }
  asm
}

/// Return the interference graph and coloring as pretty printed JSON.
pub fn return_json(alloc: &Allocation) -> Result<String> {
  let coloring = match &alloc.coloring {
    Some(coloring) => coloring,
    None => bail!("No coloring with {} registers", alloc.num_regs),
  };

  let json = JsonAllocation {
    coloring: coloring.iter().map(|(var, &reg)| (var.name(), reg)).collect(),
    graph: alloc
      .igraph
      .order()
      .iter()
      .map(|node| {
        let neighs = alloc
          .igraph
          .sorted_neighbors(node)
          .into_iter()
          .map(|n| n.name())
          .collect();
        (node.name(), neighs)
      })
      .collect(),
    num_registers: alloc.num_regs,
  };
  Ok(serde_json::to_string_pretty(&json)?)
}

/// Translate a feasible allocation and return the assembly text.
pub fn emit_asm(alloc: &Allocation) -> Result<String> {
  let lines = abs2asm::translate(alloc)?;
  Ok(return_asm(&lines))
}

/// Write `text` to `output`, or to stdout when no file is given.
pub fn write_output(text: &str, output: Option<&str>) -> Result<()> {
  match output {
    Some(filename) => {
      let mut file =
        File::create(filename).with_context(|| format!("Couldn't create {}", filename))?;
      file.write_all(text.as_bytes())?;
    }
    None => {
      let stdout = std::io::stdout();
      let mut handle = stdout.lock();
      handle.write_all(text.as_bytes())?;
      handle.flush()?;
    }
  }
  Ok(())
}
