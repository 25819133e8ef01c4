//! # **bridge** 的 Kafka 实现
//!
//!

pub mod config;
pub mod errors;
pub mod receiver;
pub mod sender;
pub mod topic;


use crate::{config::KafkaSettings, receiver::KafkaReceiver, sender::KafkaSession};
use bridge::{
    config::{BrokerConfig, OffsetReset},
    domain::Broker,
    errors::BrokerError,
};
use std::sync::Arc;

/// Kafka 消息代理
pub struct KafkaBroker {
    config: Arc<BrokerConfig>,
    settings: KafkaSettings,
}

impl KafkaBroker {
    /// 构造 Kafka 消息代理
    pub fn new(config: Arc<BrokerConfig>, settings: KafkaSettings) -> Self {
        Self { config, settings }
    }
}

impl Broker for KafkaBroker {
    type Session = KafkaSession;
    type Receiver = KafkaReceiver;

    fn topic(&self) -> &str {
        &self.config.topic
    }

    fn open(&self) -> Result<KafkaSession, BrokerError> {
        KafkaSession::open(&self.config, &self.settings)
    }

    fn subscribe(&self, offset_reset: OffsetReset) -> Result<KafkaReceiver, BrokerError> {
        KafkaReceiver::subscribe(&self.config, &self.settings, offset_reset)
    }
}
