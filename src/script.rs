// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Operation scripts.
//!
//! Parses the script format consumed by the command-line driver and applies
//! a parsed script to a tree, writing the human-readable transcript.
//!
//! ## Script Format
//! ```text
//! 4            <- tree order
//! 3            <- operation count
//! I 10, 100    <- insert key 10 with payload 100
//! B 10         <- search key 10
//! R 10         <- remove key 10
//! ```
//!
//! The transcript carries one line per search (`O REGISTRO ESTA NA ARVORE!`
//! or `O REGISTRO NAO ESTA NA ARVORE!`), one line per unsupported opcode
//! (`OPERACAO NAO SUPORTADA!`), and ends with the level-order dump behind a
//! `-- ARVORE B` marker. Removing an absent key leaves no transcript line.

use crate::dump;
use crate::error::{TreeError, TreeResult};
use crate::store::NodeStore;
use crate::tree::BTree;
use std::io::{BufRead, Write};

/// Transcript line for a successful search.
pub const MSG_FOUND: &str = "O REGISTRO ESTA NA ARVORE!";

/// Transcript line for a failed search.
pub const MSG_NOT_FOUND: &str = "O REGISTRO NAO ESTA NA ARVORE!";

/// Transcript line for an unknown opcode.
pub const MSG_UNSUPPORTED: &str = "OPERACAO NAO SUPORTADA!";

/// Marker preceding the final dump.
pub const DUMP_MARKER: &str = "-- ARVORE B";

/// One scripted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// `I k, v`
    Insert { key: i32, value: i32 },

    /// `R k`
    Remove { key: i32 },

    /// `B k`
    Search { key: i32 },

    /// Anything with an unknown opcode; echoed as unsupported at run time.
    Unsupported { line: String },
}

/// A parsed operation script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Tree order from the first line.
    pub order: u16,

    /// Operations in script order.
    pub ops: Vec<Op>,
}

fn parse_int(token: &str, line: usize, what: &str) -> TreeResult<i32> {
    token
        .trim()
        .parse::<i32>()
        .map_err(|_| TreeError::ParseError {
            line,
            reason: format!("invalid {}: '{}'", what, token.trim()),
        })
}

/// Parse a script from a buffered reader.
///
/// ## Input Shape
/// - line 1: order
/// - line 2: operation count N
/// - N further lines, one operation each
///
/// Lines with an unknown opcode parse into `Op::Unsupported`; a malformed
/// argument on a known opcode is a `ParseError`.
pub fn parse<R: BufRead>(reader: R) -> TreeResult<Script> {
    let mut lines = reader.lines().enumerate();

    let mut next_line = |what: &str| -> TreeResult<(usize, String)> {
        match lines.next() {
            Some((n, Ok(line))) => Ok((n + 1, line)),
            Some((n, Err(e))) => Err(TreeError::ParseError {
                line: n + 1,
                reason: e.to_string(),
            }),
            None => Err(TreeError::ParseError {
                line: 0,
                reason: format!("script ended before {}", what),
            }),
        }
    };

    let (n, order_line) = next_line("the order line")?;
    let order = order_line
        .trim()
        .parse::<u16>()
        .map_err(|_| TreeError::ParseError {
            line: n,
            reason: format!("invalid order: '{}'", order_line.trim()),
        })?;

    let (n, count_line) = next_line("the operation count")?;
    let count = count_line
        .trim()
        .parse::<usize>()
        .map_err(|_| TreeError::ParseError {
            line: n,
            reason: format!("invalid operation count: '{}'", count_line.trim()),
        })?;

    let mut ops = Vec::with_capacity(count);
    for _ in 0..count {
        let (n, line) = next_line("the scripted operations")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(TreeError::ParseError {
                line: n,
                reason: "empty operation line".to_string(),
            });
        }

        let mut tokens = trimmed.splitn(2, char::is_whitespace);
        let opcode = tokens.next().unwrap_or("");
        let rest = tokens.next().unwrap_or("");
        match opcode {
            "I" => {
                let mut pieces = rest.splitn(2, ',');
                let key_token = pieces.next().unwrap_or("");
                let value_token = pieces.next().ok_or_else(|| TreeError::ParseError {
                    line: n,
                    reason: format!("insert needs 'I key, value': '{}'", trimmed),
                })?;
                ops.push(Op::Insert {
                    key: parse_int(key_token, n, "key")?,
                    value: parse_int(value_token, n, "value")?,
                });
            }
            "R" => ops.push(Op::Remove {
                key: parse_int(rest, n, "key")?,
            }),
            "B" => ops.push(Op::Search {
                key: parse_int(rest, n, "key")?,
            }),
            _ => ops.push(Op::Unsupported {
                line: trimmed.to_string(),
            }),
        }
    }

    Ok(Script { order, ops })
}

fn io_err(e: std::io::Error) -> TreeError {
    TreeError::IoError {
        operation: "write_transcript".to_string(),
        reason: e.to_string(),
    }
}

/// Apply `ops` to `tree` and write the transcript into `sink`.
///
/// Removing an absent key is swallowed (the script format has no line for
/// it); every other tree failure aborts the run.
pub fn run<S: NodeStore, W: Write>(tree: &mut BTree<S>, ops: &[Op], sink: &mut W) -> TreeResult<()> {
    for op in ops {
        match op {
            Op::Insert { key, value } => {
                tree.insert(*key, *value)?;
            }
            Op::Remove { key } => match tree.remove(*key) {
                Ok(()) | Err(TreeError::KeyNotFound { .. }) => {}
                Err(other) => return Err(other),
            },
            Op::Search { key } => {
                let message = if tree.search(*key)?.is_some() {
                    MSG_FOUND
                } else {
                    MSG_NOT_FOUND
                };
                writeln!(sink, "{}", message).map_err(io_err)?;
            }
            Op::Unsupported { .. } => {
                writeln!(sink, "{}", MSG_UNSUPPORTED).map_err(io_err)?;
            }
        }
    }

    writeln!(sink, "{}", DUMP_MARKER).map_err(io_err)?;
    dump::write_tree(tree, sink)
}
