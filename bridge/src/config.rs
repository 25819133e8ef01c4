//! # **bridge** 配置
//!
//! 进程级的 [`BrokerConfig`] 可由 [`set_config`] 显式设置；未设置时，
//! [`get_config`] 首次调用会从配置文件与环境变量解析一次并缓存。

use crate::errors::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, de::DeserializeOwned};
use std::{
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};
use tokio::time::Duration;
use tracing::{debug, info};
use validator::{Validate, ValidationError};

/// 提供 Kafka 服务地址的环境变量
pub const BOOTSTRAP_ENV: &str = "KAFKA_BOOTSTRAP_SERVERS";
/// 默认主题
pub const DEFAULT_TOPIC: &str = "SOFTWARE-CONCEPTS-GUIDE-PUB-SUB";
/// 默认客户端/消费组标识
pub const DEFAULT_GROUP_ID: &str = "software-concepts-guide/publisher-sub";

static CURRENT: RwLock<Option<Arc<BrokerConfig>>> = RwLock::new(None);

/// 消息代理连接配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct BrokerConfig {
    /// Kafka 服务地址
    #[validate(length(min = 1))]
    pub bootstrap_servers: String,
    /// 主题
    #[validate(length(min = 1))]
    pub topic: String,
    /// 生产者的客户端标识，同时也是消费者的消费组标识
    #[validate(length(min = 1))]
    pub group_id: String,
}

impl BrokerConfig {
    /// 构造消息代理连接配置
    pub fn new(
        bootstrap_servers: impl Into<String>,
        topic: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
            topic: topic.into(),
            group_id: group_id.into(),
        }
    }

    /// 从分层配置源构造
    ///
    /// 服务地址缺失或为空时返回 [`ConfigError::MissingBootstrap`]，
    /// 主题与消费组缺失时采用默认值。
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let bootstrap_servers = match config.get_string("bootstrap_servers") {
            Ok(b) if !b.trim().is_empty() => b,
            Ok(_) | Err(config::ConfigError::NotFound(_)) => {
                return Err(ConfigError::MissingBootstrap(BOOTSTRAP_ENV));
            }
            Err(e) => return Err(e.into()),
        };
        let topic = optional_string(config, "topic")?.unwrap_or_else(|| DEFAULT_TOPIC.to_owned());
        let group_id =
            optional_string(config, "group_id")?.unwrap_or_else(|| DEFAULT_GROUP_ID.to_owned());

        let cfg = Self {
            bootstrap_servers,
            topic,
            group_id,
        };
        cfg.validate().map_err(|e| ConfigError::Validation {
            section: "broker".to_owned(),
            message: e.to_string(),
        })?;
        Ok(cfg)
    }

    /// 从默认配置目录与环境变量解析
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_config(&build_config(config_root())?)
    }
}

fn optional_string(config: &Config, key: &str) -> Result<Option<String>, ConfigError> {
    match config.get_string(key) {
        Ok(v) if !v.is_empty() => Ok(Some(v)),
        Ok(_) | Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// 设置进程级配置，替换之前的值
///
/// 设置时不做验证。
pub fn set_config(cfg: BrokerConfig) {
    let mut current = CURRENT.write().unwrap_or_else(PoisonError::into_inner);
    info!(topic = %cfg.topic, group_id = %cfg.group_id, "设置消息代理配置");
    *current = Some(Arc::new(cfg));
}

/// 获取进程级配置
///
/// 从未设置时解析一次并缓存；解析失败不会留下任何配置。
pub fn get_config() -> Result<Arc<BrokerConfig>, ConfigError> {
    if let Some(cfg) = CURRENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Ok(Arc::clone(cfg));
    }

    let mut current = CURRENT.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(cfg) = current.as_ref() {
        return Ok(Arc::clone(cfg));
    }
    let cfg = Arc::new(BrokerConfig::load()?);
    info!(topic = %cfg.topic, group_id = %cfg.group_id, "从环境解析消息代理配置");
    *current = Some(Arc::clone(&cfg));
    Ok(cfg)
}

/// 配置目录，取自 `BRIDGE_CONFIG_ROOT`，默认为当前目录下的 `config`
pub fn config_root() -> PathBuf {
    std::env::var("BRIDGE_CONFIG_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"))
}

/// 构建分层配置
///
/// 依次叠加 `default`、`BRIDGE_ENV` 指定环境（默认 `dev`）的配置文件，
/// 以及前缀为 `KAFKA_` 的环境变量。
pub fn build_config(config_root: PathBuf) -> Result<Config, ConfigError> {
    let env = std::env::var("BRIDGE_ENV").unwrap_or_else(|_| "dev".to_string());
    debug!("从 {} 加载 {env} 环境配置", config_root.display());
    let config = Config::builder()
        .add_source(File::from(config_root.join("default")).required(false))
        .add_source(File::from(config_root.join(env)).required(false))
        .add_source(
            Environment::with_prefix("KAFKA")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    Ok(config)
}

/// 加载配置节，缺失时采用默认值
pub fn load_section<T>(config: &Config, section: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate + Default,
{
    let cfg = match config.get::<T>(section) {
        Ok(c) => c,
        Err(config::ConfigError::NotFound(_)) => T::default(),
        Err(e) => return Err(e.into()),
    };
    validate_section(&cfg, section)?;
    Ok(cfg)
}

/// 验证配置节
pub fn validate_section<T: Validate>(cfg: &T, section: &str) -> Result<(), ConfigError> {
    cfg.validate().map_err(|e| ConfigError::Validation {
        section: section.to_string(),
        message: e.to_string(),
    })
}

/// 发布会话模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// 整个生产者生命周期复用同一发布会话
    #[default]
    Shared,
    /// 每条消息打开并关闭一次发布会话
    PerMessage,
}

/// 生产者配置
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_batch"))]
pub struct PublisherConfig {
    /// 批次最少消息数
    #[validate(range(min = 1))]
    pub batch_min: usize,
    /// 批次最多消息数
    #[validate(range(min = 1))]
    pub batch_max: usize,
    /// 消息 id 上界（不含）
    #[validate(range(min = 1))]
    pub id_bound: i64,
    /// 批次间最长等待毫秒数（不含），为 0 时不等待
    pub max_delay: u64,
    /// 发布会话模式
    pub session: SessionMode,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            batch_min: 1,
            batch_max: 10,
            id_bound: 1000,
            max_delay: 3000,
            session: SessionMode::Shared,
        }
    }
}

fn validate_batch(cfg: &PublisherConfig) -> Result<(), ValidationError> {
    if cfg.batch_min > cfg.batch_max {
        return Err(ValidationError::new("batch_range"));
    }
    Ok(())
}

/// 订阅起始位置，仅在消费组没有已提交偏移时生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OffsetReset {
    /// 从最早可用偏移开始
    #[default]
    Earliest,
    /// 从最新偏移开始
    Latest,
}

impl OffsetReset {
    /// Kafka `auto.offset.reset` 取值
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetReset::Earliest => "earliest",
            OffsetReset::Latest => "latest",
        }
    }
}

/// 解码失败策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// 停止订阅者
    #[default]
    Stop,
    /// 记录并跳过该消息
    Skip,
}

/// 订阅者配置
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct SubscriberConfig {
    /// 单次轮询最长等待毫秒数
    #[validate(range(min = 1))]
    pub poll_timeout: u64,
    /// 订阅起始位置
    pub offset_reset: OffsetReset,
    /// 解码失败策略
    pub on_decode_error: DecodePolicy,
}

impl SubscriberConfig {
    /// 单次轮询最长等待时间
    pub fn poll_wait(&self) -> Duration {
        Duration::from_millis(self.poll_timeout)
    }
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            poll_timeout: 1000,
            offset_reset: OffsetReset::Earliest,
            on_decode_error: DecodePolicy::Stop,
        }
    }
}
