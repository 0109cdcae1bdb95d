use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equation_server::{GameServer, ServerConfig};
use protocol::{DEFAULT_BOARD_SIZE, DEFAULT_PORT};

/// 方程棋服务端：接受两名玩家并主持对局
#[derive(Parser, Debug)]
#[command(name = "equation-server")]
#[command(about = "Authoritative server for the two-player equation game", long_about = None)]
#[command(version)]
struct Cli {
    /// 监听端口（1-65535，建议 1024 以上）
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// 棋盘边长（4-30）
    #[arg(default_value_t = DEFAULT_BOARD_SIZE)]
    board_size: usize,

    /// 监听地址
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("equation_server=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    // 参数错误在任何网络操作之前退出
    let config = ServerConfig::new(cli.host, cli.port, cli.board_size)?;

    info!(port = config.port, board_size = config.board_size, "方程棋服务端启动中...");
    GameServer::run(config).await?;

    Ok(())
}
