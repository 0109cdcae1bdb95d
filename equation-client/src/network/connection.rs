//! 网络连接管理
//!
//! 使用 protocol 库的传输层抽象。读端交给后台任务，消息经通道送回主循环。

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use protocol::{
    ClientMessage, Connection, Connector, FrameReader, FrameWriter, NetworkConfig, ProtocolError,
    ServerMessage, TcpConnector,
};

use super::NetworkEvent;

/// 到服务端的连接（写端）
pub struct NetworkConnection {
    writer: FrameWriter<OwnedWriteHalf>,
    peer_addr: Option<String>,
}

impl NetworkConnection {
    /// 连接服务端并启动接收任务
    pub async fn connect(
        config: &NetworkConfig,
    ) -> protocol::Result<(Self, mpsc::UnboundedReceiver<NetworkEvent>)> {
        let addr = config.address();
        let conn = TcpConnector.connect(&addr).await?;
        let peer_addr = conn.peer_addr();
        info!(%addr, "connected to server");

        let (reader, writer) = conn.split();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(receive_loop(reader, tx));

        Ok((Self { writer, peer_addr }, rx))
    }

    /// 发送消息
    pub async fn send(&mut self, msg: &ClientMessage) -> protocol::Result<()> {
        debug!(?msg, "sending");
        self.writer.write_frame(msg).await
    }

    /// 断开连接
    pub async fn disconnect(mut self) -> protocol::Result<()> {
        self.writer.shutdown().await
    }

    pub fn peer_addr(&self) -> Option<&str> {
        self.peer_addr.as_deref()
    }
}

async fn receive_loop(
    mut reader: FrameReader<OwnedReadHalf>,
    tx: mpsc::UnboundedSender<NetworkEvent>,
) {
    loop {
        let event = match reader.read_frame::<ServerMessage>().await {
            Ok(msg) => NetworkEvent::Message(msg),
            Err(ProtocolError::ConnectionClosed) => {
                info!("server closed the connection");
                let _ = tx.send(NetworkEvent::Closed);
                break;
            }
            Err(e) => {
                warn!(error = %e, "receive error");
                let _ = tx.send(NetworkEvent::Failed(e.to_string()));
                break;
            }
        };
        if tx.send(event).is_err() {
            break;
        }
    }
}
