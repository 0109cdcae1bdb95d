//! 传输层抽象
//!
//! Connector/Connection/Listener traits 把对局逻辑与底层传输隔开，
//! 服务端与终端客户端共用同一套分帧规则。

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::constants::{CONNECT_TIMEOUT, DEFAULT_PORT, MAX_FRAME_SIZE, PROTOCOL_VERSION};
use crate::error::{ProtocolError, Result};

/// 网络配置（客户端使用）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
}

impl NetworkConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port` 形式的地址
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", DEFAULT_PORT)
    }
}

/// 连接抽象 trait（核心抽象，用于业务层）
#[async_trait]
pub trait Connection: Send + Sync {
    /// 发送消息
    async fn send<M: Serialize + Send + Sync>(&mut self, msg: &M) -> Result<()>;

    /// 接收消息
    async fn recv<M: DeserializeOwned>(&mut self) -> Result<M>;

    /// 关闭连接
    async fn close(&mut self) -> Result<()>;

    /// 获取远端地址
    fn peer_addr(&self) -> Option<String>;
}

/// 连接器 trait（客户端使用）
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// 建立连接
    async fn connect(&self, addr: &str) -> Result<Self::Conn>;
}

/// 监听器 trait（服务端使用）
#[async_trait]
pub trait Listener: Send + Sync + Sized {
    type Conn: Connection;

    /// 绑定地址
    async fn bind(addr: &str) -> Result<Self>;

    /// 接受连接
    async fn accept(&mut self) -> Result<Self::Conn>;

    /// 获取本地地址
    fn local_addr(&self) -> Option<String>;
}

// ============================================================================
// TCP 实现
// ============================================================================

/// TCP 连接器
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Conn = TcpConnection;

    async fn connect(&self, addr: &str) -> Result<Self::Conn> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::ConnectionTimeout)??;
        TcpConnection::from_stream(stream)
    }
}

/// TCP 连接
pub struct TcpConnection {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
    peer_addr: Option<String>,
}

impl TcpConnection {
    /// 从 TcpStream 创建
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: FrameReader::new(read_half),
            writer: FrameWriter::new(write_half),
            peer_addr,
        })
    }

    /// 分离读写端，读端留在连接任务，写端交给发送任务
    pub fn split(self) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
        (self.reader, self.writer)
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn send<M: Serialize + Send + Sync>(&mut self, msg: &M) -> Result<()> {
        self.writer.write_frame(msg).await
    }

    async fn recv<M: DeserializeOwned>(&mut self) -> Result<M> {
        self.reader.read_frame().await
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

/// TCP 监听器
pub struct TcpListener {
    listener: tokio::net::TcpListener,
}

#[async_trait]
impl Listener for TcpListener {
    type Conn = TcpConnection;

    async fn bind(addr: &str) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    async fn accept(&mut self) -> Result<Self::Conn> {
        let (stream, _addr) = self.listener.accept().await?;
        TcpConnection::from_stream(stream)
    }

    fn local_addr(&self) -> Option<String> {
        self.listener.local_addr().ok().map(|a| a.to_string())
    }
}

// ============================================================================
// 帧编解码
// ============================================================================

/// 帧头大小: 1 字节版本 + 4 字节长度
const HEADER_SIZE: usize = 5;

fn map_eof(e: std::io::Error) -> ProtocolError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::ConnectionClosed
    } else {
        ProtocolError::Io(e)
    }
}

/// 帧读取器
pub struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> FrameReader<R> {
    /// 创建新的帧读取器
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
        }
    }

    /// 读取并解码一帧消息
    ///
    /// 对端正常关闭时返回 `ConnectionClosed`。
    pub async fn read_frame<M: DeserializeOwned>(&mut self) -> Result<M> {
        let mut header = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header).await.map_err(map_eof)?;

        let version = header[0];
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }

        // 长度（大端序）
        let length = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
        if length > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: length,
                max: MAX_FRAME_SIZE,
            });
        }

        if self.buffer.len() < length {
            self.buffer.resize(length, 0);
        }
        self.reader
            .read_exact(&mut self.buffer[..length])
            .await
            .map_err(map_eof)?;

        let msg = bincode::deserialize(&self.buffer[..length])?;
        Ok(msg)
    }
}

/// 帧写入器
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> FrameWriter<W> {
    /// 创建新的帧写入器
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 编码并写入一帧消息
    pub async fn write_frame<M: Serialize>(&mut self, msg: &M) -> Result<()> {
        let payload = bincode::serialize(msg)?;
        if payload.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: payload.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        let mut header = [0u8; HEADER_SIZE];
        header[0] = PROTOCOL_VERSION;
        header[1..5].copy_from_slice(&(payload.len() as u32).to_be_bytes());

        self.writer.write_all(&header).await?;
        self.writer.write_all(&payload).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// 关闭写端，对端读到 EOF
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ClientMessage, ServerMessage};
    use crate::tile::{Cell, Tile, Variable};

    #[tokio::test]
    async fn test_tcp_connection() {
        let mut listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client_handle = tokio::spawn(async move {
            let mut conn = TcpConnector.connect(&addr).await.unwrap();

            conn.send(&ClientMessage::MoveRequest {
                cell: Cell::new(1, 2),
                tile: Tile::Equals,
            })
            .await
            .unwrap();

            let msg: ServerMessage = conn.recv().await.unwrap();
            match msg {
                ServerMessage::AssignRole { variable, board_size } => {
                    assert_eq!(variable, Variable::Y);
                    assert_eq!(board_size, 6);
                }
                _ => panic!("Unexpected message"),
            }
        });

        let mut conn = listener.accept().await.unwrap();
        let msg: ClientMessage = conn.recv().await.unwrap();
        match msg {
            ClientMessage::MoveRequest { cell, tile } => {
                assert_eq!(cell, Cell::new(1, 2));
                assert_eq!(tile, Tile::Equals);
            }
            _ => panic!("Unexpected message"),
        }

        conn.send(&ServerMessage::AssignRole {
            variable: Variable::Y,
            board_size: 6,
        })
        .await
        .unwrap();

        client_handle.await.unwrap();
    }

    #[test]
    fn test_default_network_config() {
        let config = NetworkConfig::default();
        assert_eq!(config.address(), "127.0.0.1:12345");
        assert_eq!(NetworkConfig::new("10.0.0.2", 4000).address(), "10.0.0.2:4000");
    }

    #[tokio::test]
    async fn test_graceful_close_detected() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = FrameWriter::new(client);
        writer.write_frame(&ClientMessage::Ping).await.unwrap();
        writer.shutdown().await.unwrap();
        drop(writer);

        let mut reader = FrameReader::new(server);
        let first: ClientMessage = reader.read_frame().await.unwrap();
        assert!(matches!(first, ClientMessage::Ping));
        let second = reader.read_frame::<ClientMessage>().await;
        assert!(matches!(second, Err(ProtocolError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_version_mismatch() {
        let (mut client, server) = tokio::io::duplex(64);
        client
            .write_all(&[PROTOCOL_VERSION + 1, 0, 0, 0, 0])
            .await
            .unwrap();

        let mut reader = FrameReader::new(server);
        let result = reader.read_frame::<ClientMessage>().await;
        assert!(matches!(
            result,
            Err(ProtocolError::VersionMismatch { actual, .. }) if actual == PROTOCOL_VERSION + 1
        ));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, server) = tokio::io::duplex(64);
        let length = (MAX_FRAME_SIZE as u32 + 1).to_be_bytes();
        let mut header = vec![PROTOCOL_VERSION];
        header.extend_from_slice(&length);
        client.write_all(&header).await.unwrap();

        let mut reader = FrameReader::new(server);
        let result = reader.read_frame::<ClientMessage>().await;
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_garbage_payload_is_error() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut frame = vec![PROTOCOL_VERSION, 0, 0, 0, 4];
        frame.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);
        client.write_all(&frame).await.unwrap();

        let mut reader = FrameReader::new(server);
        let result = reader.read_frame::<ClientMessage>().await;
        assert!(matches!(result, Err(ProtocolError::Bincode(_))));
    }
}
