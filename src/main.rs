// Register Allocator
//! Top Level Environment
//
// tacalloc <num_registers> <input_file>
//
// Reads a straight-line three-address block, builds its interference graph and
// colors it with the given number of registers. Exits with 2 when the block
// needs more registers than that.

mod abs2asm;
mod args;
mod emit;
mod ir;
mod lex;
mod parse;
mod regalloc;
mod registers;
mod utils;

use anyhow::{Context, Result};
use args::{AllocOptions, Config, EmitTarget};
use lazy_static::lazy_static;
use wasm_bindgen::prelude::*;

use std::thread;
use std::time;

use crate::parse::parser;

lazy_static! {
  static ref ALLOC_OPTIONS: AllocOptions = AllocOptions::from_config();
}

const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_INFEASIBLE: i32 = 2;

// Helper macro to time evaluating an expression (like a function call.)
macro_rules! time {
  ( $x:expr ) => {{
    let t1 = time::Instant::now();
    let result = $x;
    (result, t1.elapsed())
  }};
}

fn main() {
  let cfg = match args::parse_args() {
    Ok(cfg) => cfg,
    Err(e) => {
      eprintln!("{:#}", e);
      std::process::exit(EXIT_ERROR);
    }
  };

  // Large stack for very long blocks.
  let child = thread::Builder::new()
    .stack_size(128 * 1024 * 1024)
    .spawn(move || {
      env_logger::builder().format_timestamp(None).init();

      match run(&cfg) {
        Ok(code) => code,
        Err(e) => {
          eprintln!("{:#}", e);
          EXIT_ERROR
        }
      }
    });

  let code = match child {
    Ok(child) => child.join().unwrap_or(EXIT_ERROR),
    Err(e) => {
      eprintln!("Couldn't spawn allocator thread: {}", e);
      EXIT_ERROR
    }
  };
  // Return the value from the child thread as the return value of the allocator.
  std::process::exit(code);
}

fn run(cfg: &Config) -> Result<i32> {
  let source = std::fs::read_to_string(&cfg.file)
    .with_context(|| format!("Couldn't read file {}", cfg.file))?;

  let (tokens, lex_time) = time!(lex::tokenize(&source));
  let tokens = tokens?;
  if cfg.dump_tokens {
    println!("Tokens: {}", lex::display_tokens(&tokens));
  }

  let (seq, parse_time) = time!(parser::parse_tokens(&tokens));
  let seq = seq?;
  if seq.is_empty() {
    log::warn!("{} contains no instructions", cfg.file);
  }
  if cfg.dump_ir {
    println!("{}", seq);
  }

  let options = AllocOptions {
    ssa_rename: ALLOC_OPTIONS.ssa_rename || cfg.ssa,
    ..ALLOC_OPTIONS.clone()
  };
  log::debug!("Allocating {} with {:?}", cfg.file, options);
  let (alloc, alloc_time) = time!(regalloc::allocate(&seq, cfg.num_regs, &options));
  let alloc = alloc?;
  if cfg.dump_graph {
    print!("{}", alloc.igraph);
  }

  if cfg.verbose {
    println!("Lex time: {} us", lex_time.as_micros());
    println!("Parse time: {} us", parse_time.as_micros());
    println!("Allocation: {} us", alloc_time.as_micros());
  }

  if !alloc.is_feasible() {
    eprintln!(
      "Cannot allocate with {} register(s): the interference graph is not {}-colorable. \
       Try increasing the number of registers.",
      cfg.num_regs, cfg.num_regs
    );
    return Ok(EXIT_INFEASIBLE);
  }
  if let (true, Some(coloring)) = (cfg.verbose, &alloc.coloring) {
    println!(
      "Registers used: {} of {} for {} variables",
      coloring.num_registers_used(),
      cfg.num_regs,
      coloring.len()
    );
  }

  let text = match cfg.emit {
    EmitTarget::Asm => emit::emit_asm(&alloc)?,
    EmitTarget::Json => emit::return_json(&alloc)?,
  };
  emit::write_output(&text, cfg.output.as_deref())?;
  Ok(EXIT_OK)
}

#[wasm_bindgen]
pub fn allocate_registers(num_registers: u32, source: &str) -> String {
  match allocate_registers_inner(num_registers, source) {
    Ok(asm) => asm,
    Err(e) => format!("{:#}", e),
  }
}

fn allocate_registers_inner(num_registers: u32, source: &str) -> Result<String> {
  let seq = parser::parse_str(source)?;
  let alloc = regalloc::allocate(&seq, num_registers as usize, &ALLOC_OPTIONS)?;
  emit::emit_asm(&alloc)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_allocate_registers_entry_point() {
    let asm = allocate_registers(1, "a = 1\nb = a + 2\nlive: b\n");
    assert_eq!(asm, "\tMOV #1, R0\n\tADD #2, R0\n\tMOV R0, b\n");

    let err = allocate_registers(1, "a = 1\nb = 2\nc = a + b\nlive: c\n");
    assert!(err.contains("not colorable"), "{}", err);

    let err = allocate_registers(0, "a = 1\n");
    assert!(!err.starts_with('\t'), "{}", err);
  }

  #[test]
  fn test_allocate_registers_long_chain() {
    let n = 50_000;
    let mut source = String::from("t1 = 1\n");
    for i in 2..=n {
      source.push_str(&format!("t{} = t{} + 1\n", i, i - 1));
    }
    source.push_str(&format!("live: t{}\n", n));

    let asm = allocate_registers(1, &source);
    assert!(asm.starts_with("\tMOV #1, R0\n\tADD #1, R0\n"), "{}", &asm[..asm.len().min(200)]);
    assert!(asm.ends_with(&format!("\tMOV R0, t{}\n", n)));
    assert_eq!(asm.lines().count(), n + 1);
  }

  #[test]
  fn test_run_reports_infeasible() {
    let path = std::env::temp_dir().join(format!("tacalloc-run-{}.tac", std::process::id()));
    std::fs::write(&path, "a = 1\nb = 2\nc = a + b\nlive: c\n").unwrap();
    let file = path.to_str().unwrap().to_string();

    let cfg = args::parse_args_from(vec!["1".to_string(), file.clone()]).unwrap();
    assert_eq!(run(&cfg).unwrap(), EXIT_INFEASIBLE);

    let out = std::env::temp_dir().join(format!("tacalloc-run-{}.s", std::process::id()));
    let cfg = args::parse_args_from(vec![
      "2".to_string(),
      file,
      "-o".to_string(),
      out.to_str().unwrap().to_string(),
    ])
    .unwrap();
    assert_eq!(run(&cfg).unwrap(), EXIT_OK);
    assert!(std::fs::read_to_string(&out).unwrap().contains("ADD"));

    std::fs::remove_file(&path).unwrap();
    std::fs::remove_file(&out).unwrap();
  }
}
