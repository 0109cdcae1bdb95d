use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equation_client::{parse_command, ClientGame, Command, NetworkConnection, NetworkEvent, HELP};
use protocol::{ClientMessage, NetworkConfig, RematchChoice};

/// 方程棋终端客户端
#[derive(Parser, Debug)]
#[command(name = "equation-client")]
#[command(about = "Terminal client for the two-player equation game", long_about = None)]
#[command(version)]
struct Cli {
    /// 服务端地址
    host: String,

    /// 服务端端口（1-65535）
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("equation_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = NetworkConfig::new(cli.host, cli.port);

    let (mut conn, mut events) = NetworkConnection::connect(&config).await?;
    let mut game = ClientGame::default();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(NetworkEvent::Message(msg)) => {
                    print_lines(game.apply(msg));
                    if game.closed {
                        break;
                    }
                }
                Some(NetworkEvent::Closed) | None => {
                    println!("Connection closed by the server.");
                    break;
                }
                Some(NetworkEvent::Failed(reason)) => {
                    println!("Connection lost: {}", reason);
                    break;
                }
            },
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, leaving");
                    break;
                };
                let msg = match parse_command(&line) {
                    Ok(Command::Place { cell, tile }) => match game.precheck(cell, tile) {
                        Ok(()) => Some(ClientMessage::MoveRequest { cell, tile }),
                        Err(reason) => {
                            println!("Not sent: {}", reason);
                            None
                        }
                    },
                    Ok(Command::Continue) if game.rematch_pending => {
                        game.rematch_pending = false;
                        println!("Waiting for the other player's decision...");
                        Some(ClientMessage::RematchDecision { choice: RematchChoice::Continue })
                    }
                    Ok(Command::Continue) => {
                        println!("No rematch is being offered.");
                        None
                    }
                    Ok(Command::Quit) if game.rematch_pending => {
                        game.rematch_pending = false;
                        Some(ClientMessage::RematchDecision { choice: RematchChoice::Quit })
                    }
                    Ok(Command::Quit) => break,
                    Ok(Command::Board) => {
                        print_lines(game.render());
                        None
                    }
                    Ok(Command::Ping) => Some(ClientMessage::Ping),
                    Ok(Command::Help) => {
                        println!("{}", HELP);
                        None
                    }
                    Err(e) => {
                        println!("{}", e);
                        None
                    }
                };
                if let Some(msg) = msg {
                    if let Err(e) = conn.send(&msg).await {
                        warn!(error = %e, "send failed");
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = conn.disconnect().await {
        warn!(error = %e, "disconnect failed");
    }
    Ok(())
}
