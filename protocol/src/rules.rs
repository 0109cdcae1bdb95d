//! 落子规则与胜负判定

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::constants::MIN_EQ_LEN;
use crate::equation::evaluate;
use crate::error::MoveRejection;
use crate::tile::{Cell, Tile, Variable};

/// 获胜的等式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningLine {
    /// 等式中的变量，即获胜方
    pub variable: Variable,
    /// 按读取顺序排列的格子
    pub cells: Vec<Cell>,
    /// 读取到的等式
    pub equation: String,
    /// 变量的整数解
    pub solution: i64,
}

/// 落子合法性检查
pub struct MoveValidator;

impl MoveValidator {
    /// 按顺序检查：坐标、空格、变量归属、八方向阻挡
    ///
    /// 数字、运算符和 `=` 没有方向限制。
    pub fn validate(
        board: &Board,
        cell: Cell,
        tile: Tile,
        mover: Variable,
    ) -> Result<(), MoveRejection> {
        if !cell.is_within(board.size()) {
            return Err(MoveRejection::OutOfBounds {
                row: cell.row,
                col: cell.col,
            });
        }
        if !board.is_empty_at(cell) {
            return Err(MoveRejection::CellOccupied);
        }
        match tile.variable() {
            Some(variable) if variable != mover => Err(MoveRejection::ForeignVariable),
            Some(_) if Self::is_blocked(board, cell, mover) => {
                Err(MoveRejection::BlockedByOpponentVariable)
            }
            _ => Ok(()),
        }
    }

    /// 任一射线上出现对手变量即被阻挡，射线一直扫到棋盘边缘
    pub fn is_blocked(board: &Board, cell: Cell, mover: Variable) -> bool {
        let opponent = Tile::Variable(mover.opponent());
        board.rays_from(cell).iter().any(|ray| ray.contains(opponent))
    }
}

/// 胜负判定
pub struct WinDetector;

impl WinDetector {
    /// 新落子后的胜者，先检查落子方，再检查对手（助攻）
    pub fn detect(board: &Board, cell: Cell, mover: Variable) -> Option<WinningLine> {
        Self::find_win(board, cell, mover).or_else(|| Self::find_win(board, cell, mover.opponent()))
    }

    /// 经过 `cell` 的线上是否存在 `player` 的获胜等式
    pub fn check_win(board: &Board, cell: Cell, player: Variable) -> bool {
        Self::find_win(board, cell, player).is_some()
    }

    /// 枚举四条线上所有包含 `cell`、长度不小于 MIN_EQ_LEN 的子串，正反各读一次
    pub fn find_win(board: &Board, cell: Cell, player: Variable) -> Option<WinningLine> {
        for line in board.lines_through(cell) {
            if line.len() < MIN_EQ_LEN {
                continue;
            }
            let tiles: Vec<Tile> = line.entries.iter().map(|(_, tile)| *tile).collect();

            for start in 0..=line.anchor {
                let first_end = (line.anchor + 1).max(start + MIN_EQ_LEN);
                for end in first_end..=line.len() {
                    let span = &line.entries[start..end];

                    let forward = &tiles[start..end];
                    if let Some(solution) = evaluate(forward, player) {
                        debug!(orientation = ?line.orientation, "forward equation found");
                        return Some(Self::winning_line(player, span.iter(), solution));
                    }

                    let backward: Vec<Tile> = forward.iter().rev().copied().collect();
                    if let Some(solution) = evaluate(&backward, player) {
                        debug!(orientation = ?line.orientation, "backward equation found");
                        return Some(Self::winning_line(player, span.iter().rev(), solution));
                    }
                }
            }
        }
        None
    }

    fn winning_line<'a>(
        variable: Variable,
        span: impl Iterator<Item = &'a (Cell, Tile)>,
        solution: i64,
    ) -> WinningLine {
        let (cells, equation): (Vec<Cell>, String) =
            span.map(|(cell, tile)| (*cell, tile.to_char())).unzip();
        WinningLine {
            variable,
            cells,
            equation,
            solution,
        }
    }
}
