//! 输入处理
//!
//! 每行一条命令：`row col char` 落子，`continue`/`quit` 回应再来一局。

use thiserror::Error;

use protocol::{Cell, Tile};

/// 帮助文本
pub const HELP: &str = "\
commands:
  <row> <col> <char>   place a character, e.g. `2 3 x` or `0 0 =`
  continue             accept a rematch
  quit                 decline a rematch, or leave the game
  board                print the board again
  ping                 check the connection
  help                 show this text";

/// 终端命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Place { cell: Cell, tile: Tile },
    Continue,
    Quit,
    Board,
    Ping,
    Help,
}

/// 无法解析的输入
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("empty input")]
    Empty,

    #[error("expected `<row> <col> <char>`, got `{0}`")]
    Format(String),

    #[error("invalid coordinate `{0}`")]
    Coordinate(String),

    #[error("`{0}` is not a placeable character (0-9 + - * / = x y)")]
    Character(String),
}

/// 解析一行输入
pub fn parse_command(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => return Err(InputError::Empty),
        "continue" | "c" => return Ok(Command::Continue),
        "quit" | "q" => return Ok(Command::Quit),
        "board" | "b" => return Ok(Command::Board),
        "ping" => return Ok(Command::Ping),
        "help" | "h" | "?" => return Ok(Command::Help),
        _ => {}
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let [row, col, ch] = parts.as_slice() else {
        return Err(InputError::Format(line.to_string()));
    };

    let row: u8 = row
        .parse()
        .map_err(|_| InputError::Coordinate(row.to_string()))?;
    let col: u8 = col
        .parse()
        .map_err(|_| InputError::Coordinate(col.to_string()))?;

    let mut chars = ch.chars();
    let tile = match (chars.next(), chars.next()) {
        (Some(c), None) => Tile::from_char(c),
        _ => None,
    }
    .ok_or_else(|| InputError::Character(ch.to_string()))?;

    Ok(Command::Place {
        cell: Cell::new(row, col),
        tile,
    })
}
