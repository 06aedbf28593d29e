//! Annotated move-list encoding.
//!
//! Nested standard notation: the most popular continuation is the
//! mainline, the rest become parenthesized variations. Evaluations are
//! embedded as fixed-point `[%eval]` comments.

use std::io;

use crate::types::{PositionNode, Side};

use super::TreeNode;

fn move_token(node: &PositionNode, need_number: bool) -> String {
    match node.side {
        Side::White => format!("{}. {}", node.move_number, node.san),
        Side::Black if need_number => format!("{}... {}", node.move_number, node.san),
        Side::Black => node.san.clone(),
    }
}

fn eval_comment(node: &PositionNode) -> Option<String> {
    node.evaluation
        .as_ref()
        .map(|e| format!("{{[%eval {:.2}]}}", e.score_cp as f64 / 100.0))
}

fn write_moves<W: io::Write>(writer: &mut W, tree: &TreeNode, need_number: bool) -> io::Result<()> {
    let Some((main, variations)) = tree.children.split_first() else {
        return Ok(());
    };

    write!(writer, "{} ", move_token(&main.node, need_number))?;
    let mut main_continues_numbered = false;
    if let Some(comment) = eval_comment(&main.node) {
        write!(writer, "{comment} ")?;
        main_continues_numbered = true;
    }

    for variation in variations {
        write!(writer, "( {} ", move_token(&variation.node, true))?;
        let var_numbered = match eval_comment(&variation.node) {
            Some(comment) => {
                write!(writer, "{comment} ")?;
                true
            }
            None => false,
        };
        write_moves(writer, variation, var_numbered)?;
        write!(writer, ") ")?;
        main_continues_numbered = true;
    }

    write_moves(writer, main, main_continues_numbered)
}

/// Write a materialized tree as an annotated move list with a tag-pair
/// header block.
pub fn write_movetext<W: io::Write>(tree: &TreeNode, mut writer: W) -> io::Result<()> {
    writeln!(writer, "[Event \"{}\"]", tree.node.name)?;
    writeln!(writer, "[Site \"?\"]")?;
    writeln!(writer, "[ECO \"{}\"]", tree.node.code)?;
    writeln!(writer, "[Result \"*\"]")?;
    writeln!(writer)?;

    if let Some(comment) = eval_comment(&tree.node) {
        write!(writer, "{comment} ")?;
    }
    write_moves(&mut writer, tree, true)?;
    writeln!(writer, "*")?;
    Ok(())
}
