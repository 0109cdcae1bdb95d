//! 玩家管理
//!
//! 只有两个座位：先到的连接坐 `x`（玩家 A），后到的坐 `y`（玩家 B）。

use std::sync::atomic::{AtomicU64, Ordering};

use protocol::{PlayerId, RematchChoice, Variable};

/// 玩家信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub variable: Variable,
    /// 本轮再来一局的选择
    pub decision: Option<RematchChoice>,
}

impl Player {
    pub fn new(id: PlayerId, variable: Variable) -> Self {
        Self {
            id,
            variable,
            decision: None,
        }
    }
}

/// 玩家管理器
pub struct PlayerManager {
    x: Option<Player>,
    y: Option<Player>,
    /// ID 生成器
    next_id: AtomicU64,
}

impl PlayerManager {
    pub fn new() -> Self {
        Self {
            x: None,
            y: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// 生成新的连接 ID
    pub fn generate_id(&self) -> PlayerId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// 分配空位，`x` 优先；座位已满返回 None
    pub fn seat(&mut self, id: PlayerId) -> Option<Variable> {
        if self.x.is_none() {
            self.x = Some(Player::new(id, Variable::X));
            Some(Variable::X)
        } else if self.y.is_none() {
            self.y = Some(Player::new(id, Variable::Y));
            Some(Variable::Y)
        } else {
            None
        }
    }

    /// 移除玩家，空出座位
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        if self.x.as_ref().is_some_and(|p| p.id == id) {
            self.x.take()
        } else if self.y.as_ref().is_some_and(|p| p.id == id) {
            self.y.take()
        } else {
            None
        }
    }

    fn slot(&self, variable: Variable) -> Option<&Player> {
        match variable {
            Variable::X => self.x.as_ref(),
            Variable::Y => self.y.as_ref(),
        }
    }

    /// 获取玩家
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.iter().find(|p| p.id == id)
    }

    /// 获取玩家（可变）
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        [self.x.as_mut(), self.y.as_mut()]
            .into_iter()
            .flatten()
            .find(|p| p.id == id)
    }

    /// 玩家的变量
    pub fn variable_of(&self, id: PlayerId) -> Option<Variable> {
        self.get(id).map(|p| p.variable)
    }

    /// 持有某个变量的玩家 ID
    pub fn id_of(&self, variable: Variable) -> Option<PlayerId> {
        self.slot(variable).map(|p| p.id)
    }

    /// 获取对手 ID
    pub fn opponent_id(&self, id: PlayerId) -> Option<PlayerId> {
        let variable = self.variable_of(id)?;
        self.id_of(variable.opponent())
    }

    /// 两个座位是否都已坐满
    pub fn is_full(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// 在座玩家
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.x.iter().chain(self.y.iter())
    }

    /// 在座玩家的 ID
    pub fn ids(&self) -> Vec<PlayerId> {
        self.iter().map(|p| p.id).collect()
    }

    /// 清空双方的选择（新一轮开始）
    pub fn clear_decisions(&mut self) {
        for player in [self.x.as_mut(), self.y.as_mut()].into_iter().flatten() {
            player.decision = None;
        }
    }
}

impl Default for PlayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_order() {
        let mut manager = PlayerManager::new();
        let a = manager.generate_id();
        let b = manager.generate_id();
        let c = manager.generate_id();
        assert_ne!(a, b);

        assert_eq!(manager.seat(a), Some(Variable::X));
        assert_eq!(manager.seat(b), Some(Variable::Y));
        assert!(manager.is_full());
        assert_eq!(manager.seat(c), None);

        assert_eq!(manager.opponent_id(a), Some(b));
        assert_eq!(manager.id_of(Variable::Y), Some(b));
        assert_eq!(manager.variable_of(c), None);
    }

    #[test]
    fn test_freed_seat_is_reused() {
        let mut manager = PlayerManager::new();
        manager.seat(1);
        manager.seat(2);

        let removed = manager.remove(1).unwrap();
        assert_eq!(removed.variable, Variable::X);
        assert!(!manager.is_full());

        // 下一个连接补上空出的 x
        assert_eq!(manager.seat(3), Some(Variable::X));
        assert_eq!(manager.ids(), vec![3, 2]);
    }

    #[test]
    fn test_clear_decisions() {
        let mut manager = PlayerManager::new();
        manager.seat(1);
        manager.seat(2);
        manager.get_mut(1).unwrap().decision = Some(RematchChoice::Continue);

        manager.clear_decisions();
        assert!(manager.iter().all(|p| p.decision.is_none()));
    }
}
