//! 对局状态机
//!
//! `WaitingForPlayers → InProgress → Ended → AwaitingRematchDecision →
//! (InProgress | Terminated)`。
//!
//! 这里只做状态转换，不涉及网络；消息的组装与投递在 `server` 模块。

use thiserror::Error;
use tracing::{debug, info};

use protocol::{
    Board, Cell, ConfigError, GameResult, MoveRejection, MoveValidator, PlayerId, RematchChoice,
    Tile, Variable, WinDetector,
};

use crate::player::PlayerManager;

/// 对局阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 等待两名玩家
    WaitingForPlayers,
    /// 对局中
    InProgress,
    /// 已分出结果
    Ended,
    /// 等待双方选择是否再来一局
    AwaitingRematchDecision,
    /// 会话结束
    Terminated,
}

/// 加入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// 已入座；`started` 为 true 表示双方到齐，对局开始
    Seated { variable: Variable, started: bool },
    /// 座位已满或会话不再接受玩家
    Full,
}

/// 一次成功落子的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub by: Variable,
    /// 对局结束时为 None
    pub next_turn: Option<Variable>,
    pub result: Option<GameResult>,
}

/// 再来一局的选择结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RematchOutcome {
    /// 等待另一方
    Pending,
    /// 双方都选择继续
    Restarted { first_turn: Variable },
    /// 有一方退出
    Terminated { by: Variable },
}

/// 断线结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// 开局前离开，座位空出
    SeatFreed,
    /// 对局中断线，对手获胜，不再询问再来一局
    Forfeit { winner: Variable },
    /// 结算阶段断线，会话结束
    Terminated,
    /// 未入座的连接或会话已结束
    Ignored,
}

/// 再来一局的选择被拒绝
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RematchError {
    #[error("No rematch offer is pending")]
    NotOffered,

    #[error("Decision already recorded")]
    AlreadyDecided,

    #[error("Connection is not seated")]
    NotSeated,
}

/// 对局会话，每个服务端进程只有一个
pub struct GameSession {
    board: Board,
    players: PlayerManager,
    phase: Phase,
    turn: Variable,
    winner: Option<Variable>,
    result: Option<GameResult>,
}

impl GameSession {
    pub fn new(board_size: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            board: Board::new(board_size)?,
            players: PlayerManager::new(),
            phase: Phase::WaitingForPlayers,
            turn: Variable::X,
            winner: None,
            result: None,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &PlayerManager {
        &self.players
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> Variable {
        self.turn
    }

    pub fn winner(&self) -> Option<Variable> {
        self.winner
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// 为新连接分配 ID
    pub fn next_player_id(&self) -> PlayerId {
        self.players.generate_id()
    }

    /// 新连接入座
    pub fn join(&mut self, id: PlayerId) -> JoinOutcome {
        if self.phase != Phase::WaitingForPlayers {
            return JoinOutcome::Full;
        }
        let Some(variable) = self.players.seat(id) else {
            return JoinOutcome::Full;
        };
        info!(player_id = id, %variable, "player seated");

        let started = self.players.is_full();
        if started {
            self.phase = Phase::InProgress;
            self.turn = Variable::X;
            info!("both players seated, game started");
        }
        JoinOutcome::Seated { variable, started }
    }

    /// 校验并执行落子，一次调用内完成
    ///
    /// 被拒绝时状态不变，回合保持。
    pub fn apply_move(
        &mut self,
        id: PlayerId,
        cell: Cell,
        tile: Tile,
    ) -> Result<MoveOutcome, MoveRejection> {
        if self.phase != Phase::InProgress {
            return Err(MoveRejection::GameNotInProgress);
        }
        let mover = self
            .players
            .variable_of(id)
            .ok_or(MoveRejection::GameNotInProgress)?;
        if mover != self.turn {
            return Err(MoveRejection::NotYourTurn);
        }

        MoveValidator::validate(&self.board, cell, tile, mover)?;
        self.board.place(cell, tile)?;
        debug!(%mover, %cell, %tile, "move applied");

        if let Some(line) = WinDetector::detect(&self.board, cell, mover) {
            let winner = line.variable;
            info!(
                %winner,
                equation = %line.equation,
                solution = line.solution,
                "equation completed"
            );
            let result = GameResult::Solved {
                winner,
                line,
                assisted: winner != mover,
            };
            self.finish(Some(winner), result.clone());
            return Ok(MoveOutcome {
                by: mover,
                next_turn: None,
                result: Some(result),
            });
        }

        if self.board.is_full() {
            info!("board full without an equation");
            self.finish(None, GameResult::BoardFull);
            return Ok(MoveOutcome {
                by: mover,
                next_turn: None,
                result: Some(GameResult::BoardFull),
            });
        }

        self.turn = mover.opponent();
        Ok(MoveOutcome {
            by: mover,
            next_turn: Some(self.turn),
            result: None,
        })
    }

    fn finish(&mut self, winner: Option<Variable>, result: GameResult) {
        self.phase = Phase::Ended;
        self.winner = winner;
        self.result = Some(result);
    }

    /// 结算后询问双方是否再来一局
    pub fn offer_rematch(&mut self) -> bool {
        if self.phase != Phase::Ended {
            return false;
        }
        self.players.clear_decisions();
        self.phase = Phase::AwaitingRematchDecision;
        true
    }

    /// 记录一方的选择
    ///
    /// 任一方退出即结束会话；双方都继续时换新棋盘，`x` 先手。
    pub fn record_decision(
        &mut self,
        id: PlayerId,
        choice: RematchChoice,
    ) -> Result<RematchOutcome, RematchError> {
        if self.phase != Phase::AwaitingRematchDecision {
            return Err(RematchError::NotOffered);
        }
        let player = self.players.get_mut(id).ok_or(RematchError::NotSeated)?;
        if player.decision.is_some() {
            return Err(RematchError::AlreadyDecided);
        }
        player.decision = Some(choice);
        let by = player.variable;
        debug!(%by, ?choice, "rematch decision recorded");

        if choice == RematchChoice::Quit {
            self.phase = Phase::Terminated;
            info!(%by, "rematch declined, session terminated");
            return Ok(RematchOutcome::Terminated { by });
        }

        let all_continue = self
            .players
            .iter()
            .all(|p| p.decision == Some(RematchChoice::Continue));
        if !all_continue {
            return Ok(RematchOutcome::Pending);
        }

        self.reset();
        info!("rematch started");
        Ok(RematchOutcome::Restarted {
            first_turn: self.turn,
        })
    }

    /// 新棋盘、同样的玩家、`x` 先手
    fn reset(&mut self) {
        self.board = self.board.fresh();
        self.turn = Variable::X;
        self.winner = None;
        self.result = None;
        self.players.clear_decisions();
        self.phase = Phase::InProgress;
    }

    /// 连接断开
    pub fn disconnect(&mut self, id: PlayerId) -> DisconnectOutcome {
        let Some(variable) = self.players.variable_of(id) else {
            return DisconnectOutcome::Ignored;
        };

        match self.phase {
            Phase::WaitingForPlayers => {
                self.players.remove(id);
                info!(%variable, "player left before the game started");
                DisconnectOutcome::SeatFreed
            }
            Phase::InProgress => {
                let winner = variable.opponent();
                self.winner = Some(winner);
                self.result = Some(GameResult::Forfeit { winner });
                self.phase = Phase::Terminated;
                info!(%variable, %winner, "player disconnected, game forfeited");
                DisconnectOutcome::Forfeit { winner }
            }
            Phase::Ended | Phase::AwaitingRematchDecision => {
                self.phase = Phase::Terminated;
                info!(%variable, "player disconnected after the game, session terminated");
                DisconnectOutcome::Terminated
            }
            Phase::Terminated => DisconnectOutcome::Ignored,
        }
    }
}
