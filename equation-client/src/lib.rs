//! 方程棋终端客户端
//!
//! 连接服务端、显示棋盘、读取终端命令。所有判定以服务端为准。

pub mod game;
pub mod network;

pub use game::{parse_command, ClientGame, Command, InputError, HELP};
pub use network::{NetworkConnection, NetworkEvent};
