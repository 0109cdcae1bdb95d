//! 终端对局：本地镜像状态与命令输入

mod input;
mod state;

pub use input::{parse_command, Command, InputError, HELP};
pub use state::ClientGame;
