//! Line-oriented edit commands
//!
//! A small script language so that a front end (or the CLI) can drive the
//! editor with plain text:
//!
//! ```text
//! edit 1 0 corrected text
//! insert-row 2 below
//! delete-col 3
//! merge 0,0 0,1
//! split 0 0
//! undo
//! ```

use std::fmt;
use std::str::FromStr;

use crate::core::table::{ColumnPosition, RowPosition};
use crate::utils::error::{EditorError, EditorResult};

/// One editor action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Edit { row: usize, col: usize, text: String },
    InsertRow { index: usize, position: RowPosition },
    DeleteRow { index: usize },
    InsertColumn { index: usize, position: ColumnPosition },
    DeleteColumn { index: usize },
    Merge { cells: Vec<(usize, usize)> },
    Split { row: usize, col: usize },
    Undo,
}

/// Split off the first whitespace-delimited token
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], &input[end..]))
}

fn parse_index<'a>(token: Option<(&str, &'a str)>, what: &str) -> EditorResult<(usize, &'a str)> {
    let (token, rest) = token.ok_or_else(|| EditorError::command(format!("missing {}", what)))?;
    let value = token
        .parse()
        .map_err(|_| EditorError::command(format!("invalid {} '{}'", what, token)))?;
    Ok((value, rest))
}

fn coordinate(token: &str) -> EditorResult<(usize, usize)> {
    let invalid = || EditorError::command(format!("invalid cell '{}', expected ROW,COL", token));
    let (row, col) = token.split_once(',').ok_or_else(invalid)?;
    let row = row.trim().parse().map_err(|_| invalid())?;
    let col = col.trim().parse().map_err(|_| invalid())?;
    Ok((row, col))
}

fn finished(rest: &str, name: &str) -> EditorResult<()> {
    match next_token(rest) {
        None => Ok(()),
        Some((extra, _)) => Err(EditorError::command(format!(
            "unexpected '{}' after {}",
            extra, name
        ))),
    }
}

impl FromStr for EditCommand {
    type Err = EditorError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, rest) = next_token(line).ok_or_else(|| EditorError::command("empty command"))?;

        let command = match name.to_ascii_lowercase().as_str() {
            "edit" => {
                let (row, rest) = parse_index(next_token(rest), "row")?;
                let (col, rest) = parse_index(next_token(rest), "column")?;
                EditCommand::Edit {
                    row,
                    col,
                    text: rest.trim().to_string(),
                }
            }
            "insert-row" => {
                let (index, rest) = parse_index(next_token(rest), "row")?;
                let (side, rest) = next_token(rest).unwrap_or(("below", ""));
                let position = match side.to_ascii_lowercase().as_str() {
                    "above" => RowPosition::Above,
                    "below" => RowPosition::Below,
                    other => {
                        return Err(EditorError::command(format!(
                            "expected above or below, got '{}'",
                            other
                        )))
                    }
                };
                finished(rest, name)?;
                EditCommand::InsertRow { index, position }
            }
            "delete-row" => {
                let (index, rest) = parse_index(next_token(rest), "row")?;
                finished(rest, name)?;
                EditCommand::DeleteRow { index }
            }
            "insert-col" => {
                let (index, rest) = parse_index(next_token(rest), "column")?;
                let (side, rest) = next_token(rest).unwrap_or(("right", ""));
                let position = match side.to_ascii_lowercase().as_str() {
                    "left" => ColumnPosition::Left,
                    "right" => ColumnPosition::Right,
                    other => {
                        return Err(EditorError::command(format!(
                            "expected left or right, got '{}'",
                            other
                        )))
                    }
                };
                finished(rest, name)?;
                EditCommand::InsertColumn { index, position }
            }
            "delete-col" => {
                let (index, rest) = parse_index(next_token(rest), "column")?;
                finished(rest, name)?;
                EditCommand::DeleteColumn { index }
            }
            "merge" => {
                let cells = rest
                    .split_whitespace()
                    .map(coordinate)
                    .collect::<EditorResult<Vec<_>>>()?;
                if cells.is_empty() {
                    return Err(EditorError::command("merge needs at least one cell"));
                }
                EditCommand::Merge { cells }
            }
            "split" => {
                let (row, rest) = parse_index(next_token(rest), "row")?;
                let (col, rest) = parse_index(next_token(rest), "column")?;
                finished(rest, name)?;
                EditCommand::Split { row, col }
            }
            "undo" => {
                finished(rest, name)?;
                EditCommand::Undo
            }
            other => {
                return Err(EditorError::command(format!("unknown command '{}'", other)));
            }
        };
        Ok(command)
    }
}

impl fmt::Display for EditCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditCommand::Edit { row, col, text } => write!(f, "edit {} {} {}", row, col, text),
            EditCommand::InsertRow { index, position } => {
                let side = match position {
                    RowPosition::Above => "above",
                    RowPosition::Below => "below",
                };
                write!(f, "insert-row {} {}", index, side)
            }
            EditCommand::DeleteRow { index } => write!(f, "delete-row {}", index),
            EditCommand::InsertColumn { index, position } => {
                let side = match position {
                    ColumnPosition::Left => "left",
                    ColumnPosition::Right => "right",
                };
                write!(f, "insert-col {} {}", index, side)
            }
            EditCommand::DeleteColumn { index } => write!(f, "delete-col {}", index),
            EditCommand::Merge { cells } => {
                write!(f, "merge")?;
                for (row, col) in cells {
                    write!(f, " {},{}", row, col)?;
                }
                Ok(())
            }
            EditCommand::Split { row, col } => write!(f, "split {} {}", row, col),
            EditCommand::Undo => write!(f, "undo"),
        }
    }
}
