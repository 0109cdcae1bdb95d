//! 消息类型定义

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::MoveRejection;
use crate::rules::WinningLine;
use crate::tile::{Cell, Tile, Variable};

/// 连接 ID（服务端内部分配）
pub type PlayerId = u64;

/// 游戏结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// 有人完成了等式
    Solved {
        winner: Variable,
        line: WinningLine,
        /// 等式由对手的落子完成
        assisted: bool,
    },
    /// 对手断线，剩余一方获胜
    Forfeit { winner: Variable },
    /// 棋盘已满，无人获胜
    BoardFull,
}

impl GameResult {
    pub fn winner(&self) -> Option<Variable> {
        match self {
            GameResult::Solved { winner, .. } | GameResult::Forfeit { winner } => Some(*winner),
            GameResult::BoardFull => None,
        }
    }
}

/// 再来一局的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RematchChoice {
    Continue,
    Quit,
}

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// 有一方选择不再继续
    RematchDeclined { by: Variable },
    /// 对手断开连接
    OpponentDisconnected,
}

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    /// 落子
    MoveRequest { cell: Cell, tile: Tile },
    /// 回应再来一局
    RematchDecision { choice: RematchChoice },
    /// 心跳请求
    Ping,
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    // === 连接 ===
    /// 分配身份
    AssignRole { variable: Variable, board_size: usize },
    /// 已有两名玩家
    ServerFull,

    // === 对局 ===
    /// 双方就位，对局开始
    GameStarted { board: Board, first_turn: Variable },
    /// 落子成功，广播给双方
    MoveAccepted {
        cell: Cell,
        tile: Tile,
        by: Variable,
        /// 对局结束时为 None
        next_turn: Option<Variable>,
        board: Board,
    },
    /// 落子被拒绝，只发给落子方
    MoveRejected { reason: MoveRejection },
    /// 对局结束
    GameOver { result: GameResult },

    // === 再来一局 ===
    /// 询问是否再来一局
    RematchOffer,
    /// 双方同意，新局开始
    RematchStart { board: Board, first_turn: Variable },
    /// 会话结束，连接即将关闭
    SessionClosed { reason: CloseReason },

    // === 心跳 ===
    /// 心跳响应
    Pong,

    // === 错误 ===
    /// 错误消息
    Error { code: ErrorCode, message: String },
}

/// 错误码定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    /// 当前阶段不接受该消息
    UnexpectedMessage = 400,
    /// 已经做出过选择
    DecisionAlreadyMade = 401,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
