//! 方程棋服务端
//!
//! 包含:
//! - 启动配置
//! - 玩家座位管理
//! - 对局状态机与再来一局
//! - 消息处理
//! - 连接接入与断线检测

pub mod config;
pub mod coordinator;
pub mod player;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use coordinator::GameServer;
pub use player::{Player, PlayerManager};
pub use server::{MessageHandler, Outbound, ServerState};
pub use session::{
    DisconnectOutcome, GameSession, JoinOutcome, MoveOutcome, Phase, RematchError,
    RematchOutcome,
};
