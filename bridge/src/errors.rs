//! # **bridge** 错误定义

use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少 Kafka 服务地址
    #[error("未设置 Kafka 服务地址，请配置环境变量 {0}")]
    MissingBootstrap(&'static str),
    /// 配置源加载错误
    #[error("加载配置失败：{0}")]
    Load(#[from] config::ConfigError),
    /// 配置验证错误
    #[error("配置'{section}'验证失败：{message}")]
    Validation {
        /// 配置节
        section: String,
        /// 验证信息
        message: String,
    },
}

/// 消息编解码错误
#[derive(Debug, Error)]
pub enum CodecError {
    /// 编码错误
    #[error("消息编码错误：{0}")]
    Encoding(#[source] serde_json::Error),
    /// 解码错误
    #[error("消息解码错误：{0}")]
    Decoding(#[source] serde_json::Error),
}

/// 消息代理错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// 等待超时，对轮询而言等同于没有消息
    #[error("等待消息超时")]
    Timeout,
    /// 传输错误
    #[error("消息代理传输错误：{0}")]
    Transport(String),
}

impl From<&str> for BrokerError {
    fn from(s: &str) -> Self {
        BrokerError::Transport(s.to_owned())
    }
}

/// **bridge** 错误枚举
#[derive(Debug, Error)]
pub enum BridgeError {
    /// 编解码错误
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// 消息代理错误
    #[error(transparent)]
    Broker(#[from] BrokerError),
}
