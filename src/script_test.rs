// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{TreeError, TreeResult};
use crate::script::{parse, run, Op, DUMP_MARKER, MSG_FOUND, MSG_NOT_FOUND, MSG_UNSUPPORTED};
use crate::tree::tree::BTree;
use crate::tree::types::Order;

fn parse_str(input: &str) -> TreeResult<crate::script::Script> {
    parse(input.as_bytes())
}

#[test]
fn test_parse_basic_script() -> TreeResult<()> {
    let script = parse_str("4\n3\nI 10, 100\nB 10\nR 10\n")?;
    assert_eq!(script.order, 4);
    assert_eq!(
        script.ops,
        vec![
            Op::Insert {
                key: 10,
                value: 100
            },
            Op::Search { key: 10 },
            Op::Remove { key: 10 },
        ]
    );
    Ok(())
}

#[test]
fn test_parse_negative_keys() -> TreeResult<()> {
    let script = parse_str("3\n2\nI -5, -50\nB -5\n")?;
    assert_eq!(
        script.ops[0],
        Op::Insert {
            key: -5,
            value: -50
        }
    );
    Ok(())
}

#[test]
fn test_parse_unknown_opcode() -> TreeResult<()> {
    let script = parse_str("4\n2\nW 10\nB 10\n")?;
    assert_eq!(
        script.ops[0],
        Op::Unsupported {
            line: "W 10".to_string()
        }
    );
    assert_eq!(script.ops[1], Op::Search { key: 10 });
    Ok(())
}

#[test]
fn test_parse_rejects_bad_order_line() {
    assert!(matches!(
        parse_str("four\n1\nB 1\n"),
        Err(TreeError::ParseError { line: 1, .. })
    ));
}

#[test]
fn test_parse_rejects_bad_count_line() {
    assert!(matches!(
        parse_str("4\nmany\nB 1\n"),
        Err(TreeError::ParseError { line: 2, .. })
    ));
}

#[test]
fn test_parse_rejects_truncated_script() {
    // Count promises two operations, only one follows.
    assert!(matches!(
        parse_str("4\n2\nB 1\n"),
        Err(TreeError::ParseError { .. })
    ));
}

#[test]
fn test_parse_rejects_malformed_insert() {
    assert!(matches!(
        parse_str("4\n1\nI 10\n"),
        Err(TreeError::ParseError { line: 3, .. })
    ));
}

#[test]
fn test_run_transcript() -> TreeResult<()> {
    let script = parse_str("4\n7\nI 10, 100\nB 10\nB 99\nX 5\nR 10\nR 99\nB 10\n")?;
    let mut tree = BTree::new(Order::new(script.order).unwrap());

    let mut sink = Vec::new();
    run(&mut tree, &script.ops, &mut sink)?;
    let transcript = String::from_utf8(sink).unwrap();

    // Searches and the unknown opcode leave lines; the removals (one of an
    // absent key) leave none; the dump of the emptied tree closes it out.
    let expected = format!(
        "{}\n{}\n{}\n{}\n{}\nÁrvore vazia\n",
        MSG_FOUND, MSG_NOT_FOUND, MSG_UNSUPPORTED, MSG_NOT_FOUND, DUMP_MARKER
    );
    assert_eq!(transcript, expected);
    Ok(())
}

#[test]
fn test_run_final_dump_shape() -> TreeResult<()> {
    let script = parse_str("3\n5\nI 1, 10\nI 2, 20\nI 3, 30\nI 4, 40\nI 5, 50\n")?;
    let mut tree = BTree::new(Order::new(script.order).unwrap());

    let mut sink = Vec::new();
    run(&mut tree, &script.ops, &mut sink)?;
    let transcript = String::from_utf8(sink).unwrap();

    let expected = format!(
        "{}\nroot: [ 2: 20, 4: 40 ]\n[ 1: 10 ], [ 3: 30 ], [ 5: 50 ]\n",
        DUMP_MARKER
    );
    assert_eq!(transcript, expected);
    Ok(())
}

#[test]
fn test_run_duplicate_insert_updates() -> TreeResult<()> {
    let script = parse_str("4\n3\nI 7, 70\nI 7, 77\nB 7\n")?;
    let mut tree = BTree::new(Order::new(script.order).unwrap());

    let mut sink = Vec::new();
    run(&mut tree, &script.ops, &mut sink)?;

    assert_eq!(tree.get(7)?, Some(77));
    Ok(())
}
