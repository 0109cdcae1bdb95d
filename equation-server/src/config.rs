//! 服务端启动配置

use tracing::warn;

use protocol::{
    ConfigError, DEFAULT_BOARD_SIZE, DEFAULT_PORT, MAX_BOARD_SIZE, MIN_BOARD_SIZE,
    MIN_RECOMMENDED_PORT,
};

/// 服务端配置，在绑定端口之前完成校验
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub board_size: usize,
}

impl ServerConfig {
    /// 校验端口与棋盘大小
    ///
    /// 端口 0 无效；低于 1024 可用但会给出警告。
    pub fn new(
        host: impl Into<String>,
        port: u16,
        board_size: usize,
    ) -> Result<Self, ConfigError> {
        if port == 0 {
            return Err(ConfigError::Port(port));
        }
        if port < MIN_RECOMMENDED_PORT {
            warn!(port, "port below {} may require elevated privileges", MIN_RECOMMENDED_PORT);
        }
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&board_size) {
            return Err(ConfigError::BoardSize(board_size));
        }
        Ok(Self {
            host: host.into(),
            port,
            board_size,
        })
    }

    /// 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            board_size: DEFAULT_BOARD_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = ServerConfig::new("127.0.0.1", 12345, 6).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:12345");
        assert_eq!(ServerConfig::default().port, DEFAULT_PORT);
    }

    #[test]
    fn test_board_size_out_of_range() {
        assert_eq!(
            ServerConfig::new("127.0.0.1", 12345, 3),
            Err(ConfigError::BoardSize(3))
        );
        assert_eq!(
            ServerConfig::new("127.0.0.1", 12345, 31),
            Err(ConfigError::BoardSize(31))
        );
        assert!(ServerConfig::new("127.0.0.1", 12345, 30).is_ok());
    }

    #[test]
    fn test_port_zero_rejected() {
        assert_eq!(ServerConfig::new("127.0.0.1", 0, 6), Err(ConfigError::Port(0)));
        // 低端口只警告
        assert!(ServerConfig::new("127.0.0.1", 80, 6).is_ok());
    }
}
