//! 棋盘状态与几何扫描
//!
//! 棋盘是 N×N 的格子，每格为空或放一个字符。格子一旦写入就不再改变。
//! 线（Line）与射线（Ray）每次按需计算，不做缓存。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::error::{ConfigError, MoveRejection};
use crate::tile::{Cell, Tile};

/// 连续线的四个方向，每个方向有固定的"正向"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// 从左到右
    Horizontal,
    /// 从上到下
    Vertical,
    /// 左上到右下 ↘
    DiagonalDown,
    /// 右上到左下 ↙
    DiagonalUp,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Horizontal,
        Orientation::Vertical,
        Orientation::DiagonalDown,
        Orientation::DiagonalUp,
    ];

    /// 正向步长 (行, 列)
    pub fn step(&self) -> (i8, i8) {
        match self {
            Orientation::Horizontal => (0, 1),
            Orientation::Vertical => (1, 0),
            Orientation::DiagonalDown => (1, 1),
            Orientation::DiagonalUp => (1, -1),
        }
    }
}

/// 射线的八个方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// 步长 (行, 列)，行号向下递增
    pub fn delta(&self) -> (i8, i8) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
            Direction::NorthEast => (-1, 1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (1, -1),
        }
    }
}

/// 经过某格的最长连续非空线
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub orientation: Orientation,
    /// 按正向排列的格子与字符
    pub entries: Vec<(Cell, Tile)>,
    /// 起点格子在 `entries` 中的下标（线为空时无意义）
    pub anchor: usize,
}

impl Line {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按正向读出的字符串
    #[cfg(test)]
    fn text(&self) -> String {
        self.entries.iter().map(|(_, tile)| tile.to_char()).collect()
    }
}

/// 从某格出发（不含该格）直到棋盘边缘的射线，包含空格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ray {
    pub direction: Direction,
    pub cells: Vec<(Cell, Option<Tile>)>,
}

impl Ray {
    /// 射线上任意位置是否有指定字符
    pub fn contains(&self, tile: Tile) -> bool {
        self.cells.iter().any(|(_, t)| *t == Some(tile))
    }
}

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    /// 索引为 row * size + col，使用 Vec 以支持 serde
    cells: Vec<Option<Tile>>,
}

impl Board {
    /// 创建空棋盘，边长必须在 4-30 之间
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(ConfigError::BoardSize(size));
        }
        Ok(Self {
            size,
            cells: vec![None; size * size],
        })
    }

    /// 同样大小的空棋盘（再来一局）
    pub fn fresh(&self) -> Self {
        Self {
            size: self.size,
            cells: vec![None; self.size * self.size],
        }
    }

    /// 棋盘边长
    pub fn size(&self) -> usize {
        self.size
    }

    /// 获取指定格子的字符，越界或为空返回 None
    pub fn get(&self, cell: Cell) -> Option<Tile> {
        if cell.is_within(self.size) {
            self.cells[cell.to_index(self.size)]
        } else {
            None
        }
    }

    /// 格子是否为空（越界视为非空）
    pub fn is_empty_at(&self, cell: Cell) -> bool {
        cell.is_within(self.size) && self.cells[cell.to_index(self.size)].is_none()
    }

    /// 在空格放置字符
    ///
    /// 越界或已占用时返回错误，棋盘保持不变。
    pub fn place(&mut self, cell: Cell, tile: Tile) -> Result<(), MoveRejection> {
        if !cell.is_within(self.size) {
            return Err(MoveRejection::OutOfBounds {
                row: cell.row,
                col: cell.col,
            });
        }
        let slot = &mut self.cells[cell.to_index(self.size)];
        if slot.is_some() {
            return Err(MoveRejection::CellOccupied);
        }
        *slot = Some(tile);
        Ok(())
    }

    /// 已放置的字符数
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// 棋盘是否已满
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// 经过某格的四条连续线
    ///
    /// 每条线向两侧延伸到棋盘边缘或空格为止。格子本身为空时四条线都为空。
    pub fn lines_through(&self, cell: Cell) -> [Line; 4] {
        Orientation::ALL.map(|orientation| self.line_through(cell, orientation))
    }

    fn line_through(&self, cell: Cell, orientation: Orientation) -> Line {
        let Some(tile) = self.get(cell) else {
            return Line {
                orientation,
                entries: Vec::new(),
                anchor: 0,
            };
        };
        let (dr, dc) = orientation.step();

        let mut before = Vec::new();
        let mut cursor = cell;
        while let Some(prev) = cursor.offset(-dr, -dc, self.size) {
            match self.get(prev) {
                Some(t) => before.push((prev, t)),
                None => break,
            }
            cursor = prev;
        }
        before.reverse();

        let anchor = before.len();
        let mut entries = before;
        entries.push((cell, tile));

        let mut cursor = cell;
        while let Some(next) = cursor.offset(dr, dc, self.size) {
            match self.get(next) {
                Some(t) => entries.push((next, t)),
                None => break,
            }
            cursor = next;
        }

        Line {
            orientation,
            entries,
            anchor,
        }
    }

    /// 从某格向八个方向延伸到边缘的射线
    pub fn rays_from(&self, cell: Cell) -> [Ray; 8] {
        Direction::ALL.map(|direction| {
            let (dr, dc) = direction.delta();
            let mut cells = Vec::new();
            let mut cursor = cell;
            while let Some(next) = cursor.offset(dr, dc, self.size) {
                cells.push((next, self.get(next)));
                cursor = next;
            }
            Ray { direction, cells }
        })
    }
}

impl Board {
    /// 带行列号的文字棋盘，`marked` 中的格子显示为 `[c]`
    pub fn render_marked(&self, marked: &[Cell]) -> String {
        let mut out = String::from("   ");
        for col in 0..self.size {
            out.push_str(&format!("{:>3}", col));
        }
        out.push('\n');
        for row in 0..self.size {
            out.push_str(&format!("{:>3}", row));
            for col in 0..self.size {
                let cell = Cell::new(row as u8, col as u8);
                let ch = self.get(cell).map(|t| t.to_char()).unwrap_or('.');
                if marked.contains(&cell) {
                    out.push_str(&format!("[{}]", ch));
                } else {
                    out.push_str(&format!("{:>3}", ch));
                }
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_marked(&[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Operator, Variable};

    fn put(board: &mut Board, row: u8, col: u8, c: char) {
        board.place(Cell::new(row, col), Tile::from_char(c).unwrap()).unwrap();
    }

    #[test]
    fn test_board_size_bounds() {
        assert!(Board::new(3).is_err());
        assert!(Board::new(31).is_err());
        assert_eq!(Board::new(4).unwrap().size(), 4);
        assert_eq!(Board::new(30).unwrap().size(), 30);
    }

    #[test]
    fn test_place_occupied_leaves_board_unchanged() {
        let mut board = Board::new(6).unwrap();
        put(&mut board, 2, 2, '7');
        let before = board.clone();

        let result = board.place(Cell::new(2, 2), Tile::Equals);
        assert_eq!(result, Err(MoveRejection::CellOccupied));
        assert_eq!(board, before);
        assert_eq!(board.get(Cell::new(2, 2)), Some(Tile::Digit(7)));
    }

    #[test]
    fn test_place_out_of_bounds() {
        let mut board = Board::new(4).unwrap();
        let result = board.place(Cell::new(4, 0), Tile::Digit(1));
        assert_eq!(result, Err(MoveRejection::OutOfBounds { row: 4, col: 0 }));
        assert_eq!(board.filled_count(), 0);
    }

    #[test]
    fn test_lines_through_stop_at_gaps() {
        let mut board = Board::new(6).unwrap();
        // 第 1 行: x + 2 _ 7
        put(&mut board, 1, 0, 'x');
        put(&mut board, 1, 1, '+');
        put(&mut board, 1, 2, '2');
        put(&mut board, 1, 4, '7');
        // 第 2 列向下
        put(&mut board, 0, 2, '3');
        put(&mut board, 2, 2, '=');

        let [horizontal, vertical, down, up] = board.lines_through(Cell::new(1, 2));
        assert_eq!(horizontal.text(), "x+2");
        assert_eq!(horizontal.anchor, 2);
        assert_eq!(vertical.text(), "32=");
        assert_eq!(vertical.anchor, 1);
        assert_eq!(down.len(), 1);
        assert_eq!(up.len(), 1);
        assert_eq!(
            horizontal.entries[0],
            (Cell::new(1, 0), Tile::Variable(Variable::X))
        );
    }

    #[test]
    fn test_diagonal_orientation() {
        let mut board = Board::new(5).unwrap();
        put(&mut board, 0, 4, '1');
        put(&mut board, 1, 3, '+');
        put(&mut board, 2, 2, '2');

        let [_, _, _, up] = board.lines_through(Cell::new(1, 3));
        // 右上到左下为正向
        assert_eq!(up.text(), "1+2");
        assert_eq!(up.anchor, 1);
        assert_eq!(up.entries[1].1, Tile::Operator(Operator::Add));
    }

    #[test]
    fn test_lines_through_empty_cell() {
        let board = Board::new(4).unwrap();
        for line in board.lines_through(Cell::new(0, 0)) {
            assert!(line.is_empty());
        }
    }

    #[test]
    fn test_rays_include_empty_cells() {
        let mut board = Board::new(5).unwrap();
        put(&mut board, 0, 4, 'y');

        let rays = board.rays_from(Cell::new(0, 0));
        let east = rays.iter().find(|r| r.direction == Direction::East).unwrap();
        assert_eq!(east.cells.len(), 4);
        assert_eq!(east.cells[0].1, None);
        assert!(east.contains(Tile::Variable(Variable::Y)));

        let north = rays.iter().find(|r| r.direction == Direction::North).unwrap();
        assert!(north.cells.is_empty());
    }

    #[test]
    fn test_render_marks_cells() {
        let mut board = Board::new(4).unwrap();
        put(&mut board, 1, 0, 'x');
        put(&mut board, 1, 1, '=');

        let plain = board.to_string();
        assert_eq!(plain.lines().nth(2), Some("  1  x  =  .  ."));

        let marked = board.render_marked(&[Cell::new(1, 0)]);
        assert_eq!(marked.lines().nth(2), Some("  1[x]  =  .  ."));
        assert_eq!(marked.lines().next(), Some("     0  1  2  3"));
    }

    #[test]
    fn test_fresh_board_keeps_size() {
        let mut board = Board::new(7).unwrap();
        put(&mut board, 3, 3, '5');
        let fresh = board.fresh();
        assert_eq!(fresh.size(), 7);
        assert_eq!(fresh.filled_count(), 0);
    }
}
