//! 客户端游戏状态
//!
//! 只是服务端广播的镜像，真正的判定在服务端。

use protocol::{
    Board, Cell, CloseReason, GameResult, MoveRejection, MoveValidator, ServerMessage, Tile,
    Variable,
};

/// 客户端游戏状态
#[derive(Debug, Default)]
pub struct ClientGame {
    /// 自己的变量
    pub variable: Option<Variable>,
    /// 最近一次收到的棋盘
    pub board: Option<Board>,
    /// 当前回合，未开局或已结束时为 None
    pub turn: Option<Variable>,
    /// 上一局的结果
    pub result: Option<GameResult>,
    /// 是否在等待自己回应再来一局
    pub rematch_pending: bool,
    /// 服务端已结束会话
    pub closed: bool,
}

impl ClientGame {
    /// 是否轮到自己
    pub fn is_my_turn(&self) -> bool {
        self.variable.is_some() && self.turn == self.variable
    }

    /// 发送前的本地检查
    ///
    /// 与服务端同样的顺序，提前给出提示；服务端仍会再次校验。
    pub fn precheck(&self, cell: Cell, tile: Tile) -> Result<(), MoveRejection> {
        let (Some(board), Some(me)) = (&self.board, self.variable) else {
            return Err(MoveRejection::GameNotInProgress);
        };
        if self.turn.is_none() {
            return Err(MoveRejection::GameNotInProgress);
        }
        if !self.is_my_turn() {
            return Err(MoveRejection::NotYourTurn);
        }
        MoveValidator::validate(board, cell, tile, me)
    }

    /// 根据服务端消息更新状态，返回要显示的文字
    pub fn apply(&mut self, msg: ServerMessage) -> Vec<String> {
        let mut out = Vec::new();
        match msg {
            ServerMessage::AssignRole { variable, board_size } => {
                self.variable = Some(variable);
                out.push(format!(
                    "You are {} and play '{}' on a {}x{} board.",
                    variable.player_name(),
                    variable,
                    board_size,
                    board_size
                ));
                out.push("Waiting for the other player...".to_string());
            }
            ServerMessage::ServerFull => {
                self.closed = true;
                out.push("The server already has two players.".to_string());
            }
            ServerMessage::GameStarted { board, first_turn }
            | ServerMessage::RematchStart { board, first_turn } => {
                self.board = Some(board);
                self.turn = Some(first_turn);
                self.result = None;
                self.rematch_pending = false;
                out.push("Game started.".to_string());
                self.render_into(&mut out);
                out.push(self.turn_line());
            }
            ServerMessage::MoveAccepted { cell, tile, by, next_turn, board } => {
                self.board = Some(board);
                self.turn = next_turn;
                out.push(format!("{} placed '{}' at {}.", by.player_name(), tile, cell));
                self.render_into(&mut out);
                if next_turn.is_some() {
                    out.push(self.turn_line());
                }
            }
            ServerMessage::MoveRejected { reason } => {
                out.push(format!("Move rejected: {}", reason));
            }
            ServerMessage::GameOver { result } => {
                self.turn = None;
                out.push(self.describe_result(&result));
                let solved = matches!(result, GameResult::Solved { .. });
                self.result = Some(result);
                if solved {
                    self.render_into(&mut out);
                }
            }
            ServerMessage::RematchOffer => {
                self.rematch_pending = true;
                out.push("Play again? Type `continue` or `quit`.".to_string());
            }
            ServerMessage::SessionClosed { reason } => {
                self.closed = true;
                self.rematch_pending = false;
                out.push(match reason {
                    CloseReason::RematchDeclined { by } if Some(by) == self.variable => {
                        "You left. Session closed.".to_string()
                    }
                    CloseReason::RematchDeclined { by } => {
                        format!("{} declined a rematch. Session closed.", by.player_name())
                    }
                    CloseReason::OpponentDisconnected => {
                        "Your opponent disconnected. Session closed.".to_string()
                    }
                });
            }
            ServerMessage::Pong => out.push("pong".to_string()),
            ServerMessage::Error { code, message } => {
                out.push(format!("Server error {}: {}", code, message));
            }
        }
        out
    }

    fn turn_line(&self) -> String {
        match self.turn {
            Some(turn) if Some(turn) == self.variable => "Your turn.".to_string(),
            Some(turn) => format!("Waiting for {}.", turn.player_name()),
            None => String::new(),
        }
    }

    fn describe_result(&self, result: &GameResult) -> String {
        let you = |winner: Variable| Some(winner) == self.variable;
        match result {
            GameResult::Solved { winner, line, assisted } => {
                let who = if you(*winner) { "You win" } else { "You lose" };
                let how = if *assisted { " (completed by the opponent)" } else { "" };
                format!(
                    "{}! {} = {} from \"{}\"{}.",
                    who, winner, line.solution, line.equation, how
                )
            }
            GameResult::Forfeit { winner } if you(*winner) => {
                "Your opponent disconnected. You win by forfeit.".to_string()
            }
            GameResult::Forfeit { .. } => "You lose by forfeit.".to_string(),
            GameResult::BoardFull => "The board is full. No winner.".to_string(),
        }
    }

    /// 当前棋盘的文字形式
    pub fn render(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.render_into(&mut out);
        out
    }

    /// 上一局以等式结束时，等式所在的格子加括号标出
    fn render_into(&self, out: &mut Vec<String>) {
        let Some(board) = &self.board else {
            return;
        };
        let marked: &[Cell] = match &self.result {
            Some(GameResult::Solved { line, .. }) => &line.cells,
            _ => &[],
        };
        out.extend(board.render_marked(marked).lines().map(str::to_string));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::WinningLine;

    fn started(variable: Variable) -> ClientGame {
        let mut game = ClientGame::default();
        game.apply(ServerMessage::AssignRole { variable, board_size: 6 });
        game.apply(ServerMessage::GameStarted {
            board: Board::new(6).unwrap(),
            first_turn: Variable::X,
        });
        game
    }

    #[test]
    fn test_turn_tracking() {
        let mut game = started(Variable::Y);
        assert!(!game.is_my_turn());
        assert_eq!(
            game.precheck(Cell::new(0, 0), Tile::Digit(1)),
            Err(MoveRejection::NotYourTurn)
        );

        let mut board = Board::new(6).unwrap();
        board.place(Cell::new(0, 0), Tile::Digit(1)).unwrap();
        let lines = game.apply(ServerMessage::MoveAccepted {
            cell: Cell::new(0, 0),
            tile: Tile::Digit(1),
            by: Variable::X,
            next_turn: Some(Variable::Y),
            board,
        });
        assert!(game.is_my_turn());
        assert_eq!(lines.last().map(String::as_str), Some("Your turn."));
    }

    #[test]
    fn test_precheck_mirrors_directional_rule() {
        let mut game = started(Variable::X);
        let mut board = Board::new(6).unwrap();
        board.place(Cell::new(5, 5), Tile::Variable(Variable::Y)).unwrap();
        game.board = Some(board);

        assert_eq!(
            game.precheck(Cell::new(0, 0), Tile::Variable(Variable::X)),
            Err(MoveRejection::BlockedByOpponentVariable)
        );
        assert_eq!(game.precheck(Cell::new(0, 1), Tile::Variable(Variable::X)), Ok(()));
        assert_eq!(
            game.precheck(Cell::new(5, 5), Tile::Digit(3)),
            Err(MoveRejection::CellOccupied)
        );
    }

    #[test]
    fn test_game_over_and_rematch() {
        let mut game = started(Variable::X);
        let lines = game.apply(ServerMessage::GameOver {
            result: GameResult::Solved {
                winner: Variable::X,
                line: WinningLine {
                    variable: Variable::X,
                    cells: Vec::new(),
                    equation: "x+2=7".to_string(),
                    solution: 5,
                },
                assisted: false,
            },
        });
        assert!(lines[0].starts_with("You win!"));
        assert_eq!(game.turn, None);
        assert_eq!(
            game.precheck(Cell::new(1, 1), Tile::Digit(1)),
            Err(MoveRejection::GameNotInProgress)
        );

        game.apply(ServerMessage::RematchOffer);
        assert!(game.rematch_pending);

        game.apply(ServerMessage::RematchStart {
            board: Board::new(6).unwrap(),
            first_turn: Variable::X,
        });
        assert!(!game.rematch_pending);
        assert!(game.is_my_turn());
        assert!(game.result.is_none());
    }

    #[test]
    fn test_winning_cells_marked_on_board() {
        let mut game = started(Variable::Y);
        let mut board = Board::new(6).unwrap();
        let cells: Vec<Cell> = (0..5).map(|col| Cell::new(2, col)).collect();
        for (cell, c) in cells.iter().zip("y*3=9".chars()) {
            board.place(*cell, Tile::from_char(c).unwrap()).unwrap();
        }
        game.board = Some(board);

        let lines = game.apply(ServerMessage::GameOver {
            result: GameResult::Solved {
                winner: Variable::Y,
                line: WinningLine {
                    variable: Variable::Y,
                    cells,
                    equation: "y*3=9".to_string(),
                    solution: 3,
                },
                assisted: true,
            },
        });
        assert!(lines[0].starts_with("You win!"));
        assert!(lines.iter().any(|l| l == "  2[y][*][3][=][9]  ."));
        // 之后手动查看棋盘也保留标记
        assert!(game.render().iter().any(|l| l.contains("[y]")));
    }

    #[test]
    fn test_session_closed() {
        let mut game = started(Variable::Y);
        let lines = game.apply(ServerMessage::SessionClosed {
            reason: CloseReason::OpponentDisconnected,
        });
        assert!(game.closed);
        assert!(lines[0].contains("disconnected"));
    }
}
