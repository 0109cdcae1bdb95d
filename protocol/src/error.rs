//! 错误类型定义

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_BOARD_SIZE, MIN_BOARD_SIZE};

/// 落子被拒绝的原因
///
/// 只会发给出错的一方，不改变对局状态，也不交换回合。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveRejection {
    /// 坐标超出棋盘
    #[error("Cell ({row}, {col}) is outside the board")]
    OutOfBounds { row: u8, col: u8 },

    /// 格子已被占用
    #[error("Cell is already occupied")]
    CellOccupied,

    /// 八个方向上存在对手的变量
    #[error("A ray from this cell reaches the opponent's variable")]
    BlockedByOpponentVariable,

    /// 只能放置自己的变量
    #[error("Cannot place the opponent's variable")]
    ForeignVariable,

    /// 不是你的回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 对局不在进行中
    #[error("Game is not in progress")]
    GameNotInProgress,
}

/// 启动参数错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 棋盘大小超出范围
    #[error(
        "Board size {0} out of range ({min}-{max})",
        min = MIN_BOARD_SIZE,
        max = MAX_BOARD_SIZE
    )]
    BoardSize(usize),

    /// 端口无效
    #[error("Invalid port: {0}")]
    Port(u16),
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误（bincode）
    #[error("Bincode serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
