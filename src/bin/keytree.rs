// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! keytree CLI driver.
//!
//! Runs an operation script against a B-tree and writes the transcript:
//!
//! ```text
//! keytree script.txt transcript.txt
//! keytree script.txt transcript.txt --file index.kt
//! ```
//!
//! Without `--file` the script runs against an in-memory tree; with it, the
//! tree is created in (and persisted to) the given index file.

use anyhow::{Context, Result};
use clap::Parser;
use keytree::script;
use keytree::tree::{BTree, Order};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keytree")]
#[command(author = "Vivian Voss <ask@vvoss.dev>")]
#[command(version)]
#[command(about = "Run a B-tree operation script and write its transcript", long_about = None)]
struct Cli {
    /// Path to the operation script
    script: PathBuf,

    /// Path the transcript is written to
    output: PathBuf,

    /// Run against a file-backed tree at this path instead of in memory
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let reader = BufReader::new(
        File::open(&cli.script)
            .with_context(|| format!("cannot open script {}", cli.script.display()))?,
    );
    let parsed = script::parse(reader)
        .with_context(|| format!("cannot parse script {}", cli.script.display()))?;

    let order = Order::new(parsed.order).context("script carries an invalid order")?;

    let mut sink = BufWriter::new(
        File::create(&cli.output)
            .with_context(|| format!("cannot create transcript {}", cli.output.display()))?,
    );

    match cli.file {
        Some(index_path) => {
            let mut tree = BTree::create(&index_path, order)
                .with_context(|| format!("cannot create index {}", index_path.display()))?;
            script::run(&mut tree, &parsed.ops, &mut sink).context("script execution failed")?;
        }
        None => {
            let mut tree = BTree::new(order);
            script::run(&mut tree, &parsed.ops, &mut sink).context("script execution failed")?;
        }
    }

    sink.flush().context("cannot flush transcript")?;
    Ok(())
}
