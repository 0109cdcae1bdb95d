//! 服务器状态与消息处理
//!
//! 处理函数在持锁期间同步执行。发送队列是无界通道，入队不需要等待，
//! 所以每个客户端收到的消息顺序与状态变化顺序一致；网络写入由各连接的写任务完成。

use std::collections::HashMap;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use protocol::{
    Cell, ClientMessage, CloseReason, ConfigError, ErrorCode, GameResult, PlayerId,
    RematchChoice, ServerMessage, Tile,
};

use crate::session::{
    DisconnectOutcome, GameSession, JoinOutcome, Phase, RematchError, RematchOutcome,
};

/// 连接的发送队列
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// 服务器状态
pub struct ServerState {
    pub session: GameSession,
    /// 玩家 ID -> 消息发送通道
    pub connections: HashMap<PlayerId, Outbound>,
    /// 会话结束时置为 true
    shutdown: watch::Sender<bool>,
}

impl ServerState {
    pub fn new(board_size: usize) -> Result<Self, ConfigError> {
        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            session: GameSession::new(board_size)?,
            connections: HashMap::new(),
            shutdown,
        })
    }

    /// 订阅会话结束信号
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn is_terminated(&self) -> bool {
        self.session.phase() == Phase::Terminated
    }

    /// 发送消息给玩家
    fn send_to_player(&self, player_id: PlayerId, msg: ServerMessage) {
        if let Some(tx) = self.connections.get(&player_id) {
            if tx.send(msg).is_err() {
                debug!(player_id, "outbound queue closed, message dropped");
            }
        }
    }

    /// 广播消息给在座的所有玩家
    fn broadcast(&self, msg: ServerMessage) {
        for player_id in self.session.players().ids() {
            self.send_to_player(player_id, msg.clone());
        }
    }
}

/// 消息目标
enum Target {
    Player(PlayerId),
    All,
}

/// 待发送的消息，按加入顺序投递
struct PendingMessages {
    messages: Vec<(Target, ServerMessage)>,
    /// 投递后关闭的连接
    closing: Vec<PlayerId>,
}

impl PendingMessages {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
            closing: Vec::new(),
        }
    }

    fn send(&mut self, player_id: PlayerId, msg: ServerMessage) {
        self.messages.push((Target::Player(player_id), msg));
    }

    fn broadcast(&mut self, msg: ServerMessage) {
        self.messages.push((Target::All, msg));
    }

    fn close(&mut self, player_id: PlayerId) {
        self.closing.push(player_id);
    }

    /// 入队全部消息
    ///
    /// 要关闭的连接从表中移除，写任务排空队列后关闭连接。
    fn flush(self, state: &mut ServerState) {
        for (target, msg) in self.messages {
            match target {
                Target::Player(player_id) => state.send_to_player(player_id, msg),
                Target::All => state.broadcast(msg),
            }
        }
        for player_id in self.closing {
            state.connections.remove(&player_id);
        }
        if state.is_terminated() {
            state.shutdown.send_replace(true);
        }
    }
}

/// 消息处理器
pub struct MessageHandler;

impl MessageHandler {
    /// 新连接
    ///
    /// 入座时登记发送通道并返回分配的 ID；座位已满返回 None，由调用方回复 `ServerFull`。
    pub fn handle_connect(state: &mut ServerState, tx: Outbound) -> Option<PlayerId> {
        let player_id = state.session.next_player_id();
        let JoinOutcome::Seated { variable, started } = state.session.join(player_id) else {
            info!(player_id, "session full, connection refused");
            return None;
        };

        state.connections.insert(player_id, tx);
        let mut pending = PendingMessages::new();
        pending.send(
            player_id,
            ServerMessage::AssignRole {
                variable,
                board_size: state.session.board().size(),
            },
        );
        if started {
            pending.broadcast(ServerMessage::GameStarted {
                board: state.session.board().clone(),
                first_turn: state.session.turn(),
            });
        }
        pending.flush(state);
        Some(player_id)
    }

    /// 处理客户端消息
    pub fn handle(state: &mut ServerState, player_id: PlayerId, msg: ClientMessage) {
        let mut pending = PendingMessages::new();

        match msg {
            ClientMessage::MoveRequest { cell, tile } => {
                Self::handle_move(state, &mut pending, player_id, cell, tile)
            }
            ClientMessage::RematchDecision { choice } => {
                Self::handle_rematch_decision(state, &mut pending, player_id, choice)
            }
            ClientMessage::Ping => pending.send(player_id, ServerMessage::Pong),
        }

        pending.flush(state);
    }

    /// 处理落子
    fn handle_move(
        state: &mut ServerState,
        pending: &mut PendingMessages,
        player_id: PlayerId,
        cell: Cell,
        tile: Tile,
    ) {
        let outcome = match state.session.apply_move(player_id, cell, tile) {
            Ok(outcome) => outcome,
            Err(reason) => {
                warn!(player_id, %cell, %tile, %reason, "move rejected");
                pending.send(player_id, ServerMessage::MoveRejected { reason });
                return;
            }
        };

        pending.broadcast(ServerMessage::MoveAccepted {
            cell,
            tile,
            by: outcome.by,
            next_turn: outcome.next_turn,
            board: state.session.board().clone(),
        });

        if let Some(result) = outcome.result {
            Self::log_result(&result);
            pending.broadcast(ServerMessage::GameOver { result });
            if state.session.offer_rematch() {
                pending.broadcast(ServerMessage::RematchOffer);
            }
        }
    }

    fn log_result(result: &GameResult) {
        match result {
            GameResult::Solved { winner, line, assisted } => {
                info!(%winner, equation = %line.equation, assisted, "game over");
            }
            GameResult::Forfeit { winner } => info!(%winner, "game over by forfeit"),
            GameResult::BoardFull => info!("game over, board full"),
        }
    }

    /// 处理再来一局的选择
    fn handle_rematch_decision(
        state: &mut ServerState,
        pending: &mut PendingMessages,
        player_id: PlayerId,
        choice: RematchChoice,
    ) {
        match state.session.record_decision(player_id, choice) {
            Ok(RematchOutcome::Pending) => {}
            Ok(RematchOutcome::Restarted { first_turn }) => {
                pending.broadcast(ServerMessage::RematchStart {
                    board: state.session.board().clone(),
                    first_turn,
                });
            }
            Ok(RematchOutcome::Terminated { by }) => {
                pending.broadcast(ServerMessage::SessionClosed {
                    reason: CloseReason::RematchDeclined { by },
                });
                for id in state.session.players().ids() {
                    pending.close(id);
                }
            }
            Err(e) => {
                warn!(player_id, error = %e, "rematch decision refused");
                let code = match e {
                    RematchError::AlreadyDecided => ErrorCode::DecisionAlreadyMade,
                    RematchError::NotOffered | RematchError::NotSeated => {
                        ErrorCode::UnexpectedMessage
                    }
                };
                pending.send(
                    player_id,
                    ServerMessage::Error {
                        code,
                        message: e.to_string(),
                    },
                );
            }
        }
    }

    /// 处理玩家断线
    pub fn handle_disconnect(state: &mut ServerState, player_id: PlayerId) {
        let mut pending = PendingMessages::new();
        let opponent_id = state.session.players().opponent_id(player_id);

        match state.session.disconnect(player_id) {
            DisconnectOutcome::Forfeit { winner } => {
                if let Some(opponent_id) = opponent_id {
                    pending.send(
                        opponent_id,
                        ServerMessage::GameOver {
                            result: GameResult::Forfeit { winner },
                        },
                    );
                    Self::close_opponent(&mut pending, opponent_id);
                }
            }
            DisconnectOutcome::Terminated => {
                if let Some(opponent_id) = opponent_id {
                    Self::close_opponent(&mut pending, opponent_id);
                }
            }
            DisconnectOutcome::SeatFreed | DisconnectOutcome::Ignored => {}
        }

        // 移除连接
        state.connections.remove(&player_id);

        pending.flush(state);
    }

    fn close_opponent(pending: &mut PendingMessages, opponent_id: PlayerId) {
        pending.send(
            opponent_id,
            ServerMessage::SessionClosed {
                reason: CloseReason::OpponentDisconnected,
            },
        );
        pending.close(opponent_id);
    }
}
