//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘最小边长
pub const MIN_BOARD_SIZE: usize = 4;

/// 棋盘最大边长
pub const MAX_BOARD_SIZE: usize = 30;

/// 默认棋盘边长
pub const DEFAULT_BOARD_SIZE: usize = 6;

/// 获胜等式的最小长度（字符数）
pub const MIN_EQ_LEN: usize = 5;

/// 默认服务端端口
pub const DEFAULT_PORT: u16 = 12345;

/// 推荐的最小端口（低于此值为系统保留端口）
pub const MIN_RECOMMENDED_PORT: u16 = 1024;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
