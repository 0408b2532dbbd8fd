/**************************************************************************/
/*  This file is part of XORCOUNT.                                        */
/*                                                                        */
/*  Copyright (C) 2025                                                    */
/*    CEA (Commissariat à l'énergie atomique et aux énergies              */
/*         alternatives)                                                  */
/*                                                                        */
/*  you can redistribute it and/or modify it under the terms of the GNU   */
/*  Lesser General Public License as published by the Free Software       */
/*  Foundation, version 2.1.                                              */
/*                                                                        */
/*  It is distributed in the hope that it will be useful,                 */
/*  but WITHOUT ANY WARRANTY; without even the implied warranty of        */
/*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the         */
/*  GNU Lesser General Public License for more details.                   */
/*                                                                        */
/*  See the GNU Lesser General Public License version 2.1                 */
/*  for more details (enclosed in the file licenses/LGPLv2.1).            */
/*                                                                        */
/**************************************************************************/

#![warn(missing_docs)]

//! Approximate #SAT on CNF formulas by sparse XOR hashing.
//!
//! Random XOR constraints partition the solution space into cells of
//! roughly equal size; one cell is solved by Gaussian elimination, the
//! residual formula is counted exactly by a CDCL solver up to a small
//! threshold, and the count is scaled by 2^k. The median over independent
//! trials is the reported estimate.

pub mod cdcl;
pub mod cnf;
pub mod counter;
pub mod enumerate;
pub mod gauss;
pub mod model;
pub mod simplify;
pub mod xor;

use anyhow::Context;
use std::fs::File;
use std::path::{Path, PathBuf};
use structopt::clap::arg_enum;
use structopt::StructOpt;
use tracing::debug;

arg_enum! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Method {
        Approx,
        BruteForce,
    }
}

/// Configuration options
#[derive(Debug, StructOpt)]
#[structopt(
    name = "xorcount",
    about = "Approximates the number of models of a CNF formula"
)]
pub struct Opt {
    #[structopt(possible_values = &Method::variants(), case_insensitive = true, default_value = "approx", short, long)]
    /// How to count: XOR hashing or exhaustive enumeration
    method: Method,

    /// Number of hashing trials
    #[structopt(short, long, default_value = "10")]
    trials: usize,

    /// Inclusion probability of each variable in a random XOR constraint
    #[structopt(long, default_value = "0.1")]
    density: f64,

    /// Accept a cell once it holds at most this many models
    #[structopt(long, default_value = "50")]
    threshold: u64,

    /// Seed of the XOR generator, for reproducible runs
    #[structopt(short, long)]
    seed: Option<u64>,

    /// Input file, must end with .cnf
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// JSON output to the specified file
    #[structopt(short, long, parse(from_os_str))]
    json: Option<PathBuf>,

    /// Enable debug output
    #[structopt(long)]
    debug: bool,
}

fn setup_tracing(opt: &Opt) -> anyhow::Result<()> {
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::prelude::*;
    let min_level = if opt.debug { Level::TRACE } else { Level::INFO };
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::filter_fn(move |metadata| *metadata.level() <= min_level),
    );
    let subscriber = tracing_subscriber::Registry::default().with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default tracing collector")?;
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("opening {} to write results", path.display()))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("writing result to {}", path.display()))
}

/// entrypoint of the binary
pub fn run() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    setup_tracing(&opt)?;
    let ext = opt.input.extension().unwrap_or(std::ffi::OsStr::new(""));
    anyhow::ensure!(
        ext == "cnf",
        "don't know what to do with {}, expected a .cnf file",
        opt.input.display()
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(&opt.density),
        "--density must be within [0, 1], got {}",
        opt.density
    );
    let file = File::open(&opt.input)
        .with_context(|| format!("opening input file {}", opt.input.display()))?;
    let formula = cnf::DimacsParser::parse(file)
        .with_context(|| format!("parsing CNF file {}", opt.input.display()))?;
    debug!(
        vars = formula.var_count(),
        clauses = formula.len(),
        "parsed formula"
    );
    match opt.method {
        Method::Approx => {
            let config = counter::CounterConfig {
                trials: opt.trials,
                density: opt.density,
                threshold: opt.threshold,
                seed: opt.seed,
            };
            let result = counter::approximate(&formula, &config);
            match &opt.json {
                Some(path) => write_json(path, &result)?,
                None => println!("{}", result),
            }
        }
        Method::BruteForce => {
            let count = cnf::brute_force_model_count(&formula);
            match &opt.json {
                Some(path) => write_json(path, &count)?,
                None => println!("{}", count),
            }
        }
    }
    Ok(())
}
