//! 方程棋共享协议库
//!
//! 包含:
//! - 字符、坐标、棋盘等核心数据结构
//! - 等式判定（精确有理数求解）
//! - 落子规则与胜负判定
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - 帧编解码

mod board;
mod constants;
mod equation;
mod error;
mod message;
mod rules;
mod tile;
mod transport;

pub use board::{Board, Direction, Line, Orientation, Ray};
pub use constants::*;
pub use equation::{classify, evaluate, is_winning_equation, parse_tiles, Rational, Verdict};
pub use error::{ConfigError, MoveRejection, ProtocolError, Result};
pub use message::{
    ClientMessage, CloseReason, ErrorCode, GameResult, PlayerId, RematchChoice, ServerMessage,
};
pub use rules::{MoveValidator, WinDetector, WinningLine};
pub use tile::{Cell, Operator, Tile, Variable};
pub use transport::{
    Connection, Connector, FrameReader, FrameWriter, Listener, NetworkConfig, TcpConnection,
    TcpConnector, TcpListener,
};
