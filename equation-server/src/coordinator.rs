//! 网络协调
//!
//! 接受连接、分配身份，每个连接一个读任务和一个写任务。
//! 会话结束后停止接受新连接并返回。

use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use protocol::{
    ClientMessage, Connection, FrameReader, FrameWriter, Listener, PlayerId, ProtocolError,
    ServerMessage, TcpConnection, TcpListener,
};

use crate::config::ServerConfig;
use crate::server::{MessageHandler, ServerState};

/// 会话结束后等待写任务发完剩余消息的上限
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// 对局服务端
pub struct GameServer {
    state: Arc<Mutex<ServerState>>,
}

impl GameServer {
    pub fn new(config: &ServerConfig) -> protocol::Result<Self> {
        Ok(Self {
            state: Arc::new(Mutex::new(ServerState::new(config.board_size)?)),
        })
    }

    /// 绑定配置中的地址并运行到会话结束
    pub async fn run(config: ServerConfig) -> protocol::Result<()> {
        let server = Self::new(&config)?;
        let listener = TcpListener::bind(&config.bind_address()).await?;
        info!(
            address = %listener.local_addr().unwrap_or_default(),
            board_size = config.board_size,
            "server listening"
        );
        server.serve(listener).await
    }

    /// 在已绑定的监听器上接受连接，直到会话结束
    pub async fn serve(&self, mut listener: TcpListener) -> protocol::Result<()> {
        let mut shutdown = self.state.lock().await.subscribe_shutdown();
        let mut writers: Vec<JoinHandle<()>> = Vec::new();

        loop {
            let accepted = tokio::select! {
                accepted = listener.accept() => accepted,
                _ = shutdown.changed() => break,
            };
            match accepted {
                Ok(conn) => {
                    writers.retain(|handle| !handle.is_finished());
                    writers.extend(self.on_connect(conn).await);
                }
                Err(e) => warn!(error = %e, "accept failed"),
            }
        }

        info!("session terminated, server stopping");
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            for handle in writers {
                let _ = handle.await;
            }
        })
        .await;
        if drained.is_err() {
            warn!("timed out flushing final messages");
        }
        Ok(())
    }

    /// 返回写任务句柄，座位已满时为 None
    async fn on_connect(&self, mut conn: TcpConnection) -> Option<JoinHandle<()>> {
        let peer = conn.peer_addr().unwrap_or_default();
        let (tx, rx) = mpsc::unbounded_channel();

        let (seated, shutdown) = {
            let mut state = self.state.lock().await;
            (
                MessageHandler::handle_connect(&mut state, tx),
                state.subscribe_shutdown(),
            )
        };
        let Some(player_id) = seated else {
            info!(%peer, "rejecting connection, server full");
            if let Err(e) = conn.send(&ServerMessage::ServerFull).await {
                debug!(%peer, error = %e, "failed to notify rejected connection");
            }
            let _ = conn.close().await;
            return None;
        };

        info!(player_id, %peer, "client connected");
        let (reader, writer) = conn.split();
        tokio::spawn(read_loop(player_id, reader, self.state.clone(), shutdown));
        Some(tokio::spawn(write_loop(player_id, writer, rx)))
    }
}

/// 把发送队列中的消息写到连接上，队列关闭后关闭写端
async fn write_loop(
    player_id: PlayerId,
    mut writer: FrameWriter<OwnedWriteHalf>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = writer.write_frame(&msg).await {
            warn!(player_id, error = %e, "write failed");
            break;
        }
    }
    let _ = writer.shutdown().await;
    debug!(player_id, "writer finished");
}

/// 读取客户端消息，连接关闭或出错时按断线处理
async fn read_loop(
    player_id: PlayerId,
    mut reader: FrameReader<OwnedReadHalf>,
    state: Arc<Mutex<ServerState>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let frame = tokio::select! {
            frame = reader.read_frame::<ClientMessage>() => frame,
            _ = shutdown.changed() => break,
        };
        match frame {
            Ok(msg) => {
                debug!(player_id, ?msg, "received");
                let mut state = state.lock().await;
                MessageHandler::handle(&mut state, player_id, msg);
            }
            Err(ProtocolError::ConnectionClosed) => {
                info!(player_id, "client disconnected");
                break;
            }
            Err(e) => {
                warn!(player_id, error = %e, "protocol error, dropping connection");
                break;
            }
        }
    }

    let mut state = state.lock().await;
    MessageHandler::handle_disconnect(&mut state, player_id);
}
