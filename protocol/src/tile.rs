//! 棋子（字符）与坐标定义

use std::fmt;

use serde::{Deserialize, Serialize};

/// 玩家变量，同时代表玩家身份
///
/// 第一个连接的玩家为 A，使用 `x` 并先手；第二个为 B，使用 `y`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// 玩家 A（先手）
    X,
    /// 玩家 B（后手）
    Y,
}

impl Variable {
    /// 获取对方变量
    pub fn opponent(&self) -> Variable {
        match self {
            Variable::X => Variable::Y,
            Variable::Y => Variable::X,
        }
    }

    /// 棋盘上显示的字符
    pub fn to_char(&self) -> char {
        match self {
            Variable::X => 'x',
            Variable::Y => 'y',
        }
    }

    /// 从字符解析
    pub fn from_char(c: char) -> Option<Variable> {
        match c {
            'x' => Some(Variable::X),
            'y' => Some(Variable::Y),
            _ => None,
        }
    }

    /// 玩家名称
    pub fn player_name(&self) -> &'static str {
        match self {
            Variable::X => "Player A",
            Variable::Y => "Player B",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// 四则运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn to_char(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }

    pub fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }
}

/// 可以放在格子里的字符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// 数字 0-9
    Digit(u8),
    /// 运算符
    Operator(Operator),
    /// 等号
    Equals,
    /// 玩家变量
    Variable(Variable),
}

impl Tile {
    /// 转换为字符
    pub fn to_char(&self) -> char {
        match self {
            Tile::Digit(d) => char::from(b'0' + d),
            Tile::Operator(op) => op.to_char(),
            Tile::Equals => '=',
            Tile::Variable(v) => v.to_char(),
        }
    }

    /// 从字符解析，不在字母表中的字符返回 None
    pub fn from_char(c: char) -> Option<Tile> {
        if let Some(d) = c.to_digit(10) {
            return Some(Tile::Digit(d as u8));
        }
        if c == '=' {
            return Some(Tile::Equals);
        }
        Operator::from_char(c)
            .map(Tile::Operator)
            .or_else(|| Variable::from_char(c).map(Tile::Variable))
    }

    /// 是否是变量
    pub fn variable(&self) -> Option<Variable> {
        match self {
            Tile::Variable(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// 棋盘坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// 行（0 为最上方）
    pub row: u8,
    /// 列（0 为最左侧）
    pub col: u8,
}

impl Cell {
    /// 创建新坐标（不检查边界）
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// 检查坐标是否在给定大小的棋盘内
    pub fn is_within(&self, size: usize) -> bool {
        (self.row as usize) < size && (self.col as usize) < size
    }

    /// 获取偏移后的坐标，越界返回 None
    pub fn offset(&self, dr: i8, dc: i8, size: usize) -> Option<Cell> {
        let row = self.row as i16 + dr as i16;
        let col = self.col as i16 + dc as i16;
        if row >= 0 && col >= 0 && (row as usize) < size && (col as usize) < size {
            Some(Cell::new(row as u8, col as u8))
        } else {
            None
        }
    }

    /// 转换为数组索引
    pub fn to_index(&self, size: usize) -> usize {
        self.row as usize * size + self.col as usize
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_alphabet() {
        for c in "0123456789+-*/=xy".chars() {
            let tile = Tile::from_char(c).unwrap();
            assert_eq!(tile.to_char(), c);
        }
        assert_eq!(Tile::from_char('z'), None);
        assert_eq!(Tile::from_char(' '), None);
        assert_eq!(Tile::from_char('^'), None);
    }

    #[test]
    fn test_variable_opponent() {
        assert_eq!(Variable::X.opponent(), Variable::Y);
        assert_eq!(Variable::Y.opponent(), Variable::X);
        assert_eq!(Tile::Variable(Variable::Y).variable(), Some(Variable::Y));
        assert_eq!(Tile::Digit(3).variable(), None);
    }

    #[test]
    fn test_cell_offset() {
        let cell = Cell::new(0, 0);
        assert_eq!(cell.offset(-1, 0, 6), None);
        assert_eq!(cell.offset(1, 1, 6), Some(Cell::new(1, 1)));
        assert_eq!(Cell::new(5, 5).offset(0, 1, 6), None);
        assert_eq!(Cell::new(2, 3).to_index(6), 15);
    }
}
