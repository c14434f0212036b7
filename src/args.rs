// Register Allocator
//! Parse command line arguments
//! Hand rolled, like the rest of the driver. The interface is small enough.

use std::env;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const USAGE: &str = "usage: tacalloc [-v] [--dump-tokens] [--dump-ir] [--dump-graph] [--ssa] \
                         [-e asm|json] [-o <file>] <num_registers> <input_file>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitTarget {
  Asm,
  Json,
}

fn get_alloc_config_file_path() -> String {
  let source_dir = env!("CARGO_MANIFEST_DIR");
  format!("{}/{}", source_dir, "alloc_opt.toml")
}

/// Configuration options for this run.
#[derive(Debug)]
pub struct Config {
  pub verbose: bool,
  pub dump_tokens: bool,
  pub dump_ir: bool,
  pub dump_graph: bool,
  pub ssa: bool,

  pub emit: EmitTarget,
  pub output: Option<String>,
  pub num_regs: usize,
  pub file: String,
}

/// Options of the allocation pipeline, read from `alloc_opt.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AllocOptions {
  /// Give every definition a fresh name before building the graph.
  pub ssa_rename: bool,
  /// Cap on tentative assignments made by the colorer. None means unbounded.
  pub step_limit: Option<u64>,
}

impl AllocOptions {
  pub fn from_config() -> Self {
    let config_file = get_alloc_config_file_path();
    match std::fs::read_to_string(&config_file) {
      Ok(config) => Self::from_toml(&config).unwrap_or_else(|e| {
        log::warn!("Ignoring {}: {:#}", config_file, e);
        AllocOptions::default()
      }),
      Err(_) => AllocOptions::default(),
    }
  }

  pub fn from_toml(config: &str) -> Result<Self> {
    Ok(toml::from_str(config)?)
  }
}

impl Config {
  fn default() -> Self {
    Config {
      verbose: false,     // Phase timings
      dump_tokens: false, // Print the token stream
      dump_ir: false,     // Print the parsed instruction list
      dump_graph: false,  // Print the interference graph
      ssa: false,         // Rename every definition before allocation

      emit: EmitTarget::Asm, // Kind of output
      output: None,          // Output file, stdout if absent
      num_regs: 0,
      file: String::new(),
    }
  }
}

/// Parses command line input into a configuration.
pub fn parse_args() -> Result<Config> {
  parse_args_from(env::args().skip(1).collect())
}

/// Parses `args` (without the program name) into a configuration.
pub fn parse_args_from(args: Vec<String>) -> Result<Config> {
  let mut config = Config::default();
  let mut positional = vec![];
  let mut index = 0;
  while index < args.len() {
    match args[index].as_str() {
      "-v" | "--verbose" => config.verbose = true,
      "--dump-tokens" => config.dump_tokens = true,
      "--dump-ir" => config.dump_ir = true,
      "--dump-graph" => config.dump_graph = true,
      "--ssa" => config.ssa = true,
      "-e" | "--emit" => {
        // Allow for the emit type to be the next space-delimited token.
        index += 1;
        config.emit = match args.get(index).map(String::as_str) {
          Some("asm") => EmitTarget::Asm,
          Some("json") => EmitTarget::Json,
          Some(other) => bail!("Unknown emit type: {}", other),
          None => bail!("Expected emit type\n{}", USAGE),
        };
      }
      "-easm" => config.emit = EmitTarget::Asm,
      "-ejson" => config.emit = EmitTarget::Json,
      "-o" => {
        index += 1;
        match args.get(index) {
          Some(file) => config.output = Some(file.clone()),
          None => bail!("Expected output file\n{}", USAGE),
        }
      }
      flag if flag.starts_with('-') && flag.len() > 1 => bail!("Unknown flag: {}\n{}", flag, USAGE),
      arg => positional.push(arg.to_string()),
    };
    index += 1;
  }

  let (num_regs, file) = match positional.as_slice() {
    [num_regs, file] => (num_regs, file),
    _ => bail!("Expected 2 arguments, got {}\n{}", positional.len(), USAGE),
  };

  config.num_regs = num_regs
    .parse::<usize>()
    .ok()
    .filter(|&k| k > 0)
    .with_context(|| format!("Number of registers must be a positive integer, got '{}'", num_regs))?;

  if !Path::new(file).is_file() {
    bail!("Input file not found: {}", file);
  }
  config.file = file.clone();

  Ok(config)
}
