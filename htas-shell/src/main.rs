/*
SPDX-License-Identifier: MIT
*/

//! HTAS shell – drives the scheduling core from the command line.
//!
//! Runs one command with `-c` or starts a plain line-oriented loop on stdin.
//! Line editing, history and terminal handling are deliberately out of
//! scope.

mod shell;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use htas_core::config;
use htas_core::topology::Topology;

use crate::shell::Shell;

#[derive(Debug, Parser)]
#[command(name = "htas-shell", about = "Hint-based topology-aware scheduler shell")]
struct Cli {
    /// Optional YAML topology override file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run one command and exit instead of starting the interactive loop
    #[arg(short = 'c', long, value_name = "COMMAND")]
    command: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let topology = match &cli.config {
        Some(path) => config::load_topology(path)?,
        None => Topology::default(),
    };
    let mut shell = Shell::new(topology);

    if let Some(line) = cli.command {
        return match shell.execute(&line) {
            Ok(out) => {
                print!("{out}");
                Ok(())
            }
            Err(err) => {
                println!("{err}");
                std::process::exit(1);
            }
        };
    }

    println!("HTAS scheduling shell. Type 'help'.");
    let stdin = std::io::stdin();
    loop {
        print!("htas> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line == "exit" || line == "quit" {
            break;
        }
        match shell.execute(line) {
            Ok(out) => print!("{out}"),
            Err(err) => println!("{err}"),
        }
    }
    Ok(())
}
