//! Kafka 客户端配置

use bridge::{
    config::{BrokerConfig, OffsetReset, build_config, config_root},
    errors::ConfigError,
};
use rdkafka::ClientConfig;
use std::collections::HashMap;
use tokio::time::Duration;

/// Kafka 客户端附加配置
///
/// `producer` 与 `consumer` 配置节原样写入 rdkafka 客户端配置，
/// 服务地址与客户端标识始终以 [`BrokerConfig`] 为准。
#[derive(Debug, Clone)]
pub struct KafkaSettings {
    /// 消息投递与管理操作的等待时间
    pub timeout: Duration,
    /// 生产者附加配置
    pub producer: HashMap<String, String>,
    /// 消费者附加配置
    pub consumer: HashMap<String, String>,
}

impl Default for KafkaSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(45),
            producer: HashMap::new(),
            consumer: HashMap::new(),
        }
    }
}

impl KafkaSettings {
    /// 从分层配置源构造
    pub fn from_config(config: &config::Config) -> Result<Self, ConfigError> {
        let timeout = match config.get::<u64>("timeout") {
            Ok(t) => Duration::from_secs(t),
            Err(config::ConfigError::NotFound(_)) => Duration::from_secs(45),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            timeout,
            producer: load_setting(config, "producer")?,
            consumer: load_setting(config, "consumer")?,
        })
    }

    /// 从默认配置目录与环境变量解析
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_config(&build_config(config_root())?)
    }
}

fn load_setting(
    config: &config::Config,
    section: &str,
) -> Result<HashMap<String, String>, ConfigError> {
    match config.get::<HashMap<String, String>>(section) {
        Ok(map) => Ok(map),
        Err(config::ConfigError::NotFound(_)) => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}

#[inline]
fn client_config(settings: &HashMap<String, String>, broker: &BrokerConfig) -> ClientConfig {
    let mut config = ClientConfig::new();
    for (key, value) in settings {
        config.set(key, value);
    }
    config.set("bootstrap.servers", &broker.bootstrap_servers);
    config
}

pub(crate) fn producer_config(broker: &BrokerConfig, settings: &KafkaSettings) -> ClientConfig {
    let mut config = client_config(&settings.producer, broker);
    config.set("client.id", &broker.group_id);
    config
}

pub(crate) fn consumer_config(
    broker: &BrokerConfig,
    settings: &KafkaSettings,
    offset_reset: OffsetReset,
) -> ClientConfig {
    let mut config = client_config(&settings.consumer, broker);
    config.set("group.id", &broker.group_id);
    config.set("auto.offset.reset", offset_reset.as_str());
    config
}

pub(crate) fn admin_config(broker: &BrokerConfig) -> ClientConfig {
    client_config(&HashMap::new(), broker)
}
