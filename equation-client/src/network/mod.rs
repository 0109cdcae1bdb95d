//! 网络通信模块

mod connection;

pub use connection::*;

use protocol::ServerMessage;

/// 接收任务上报的网络事件
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// 收到服务端消息
    Message(ServerMessage),
    /// 服务端关闭了连接
    Closed,
    /// 读取出错，连接不可再用
    Failed(String),
}
