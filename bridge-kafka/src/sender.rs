//! # Kafka 发布会话

use crate::{
    config::{KafkaSettings, producer_config},
    errors::transport,
};
use bridge::{config::BrokerConfig, domain::Publish, errors::BrokerError};
use rdkafka::producer::{FutureProducer, FutureRecord, future_producer::Delivery};
use tokio::time::Duration;
use tracing::debug;

/// Kafka 发布会话
pub struct KafkaSession {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaSession {
    /// 以消息代理配置中的客户端标识打开发布会话
    pub fn open(broker: &BrokerConfig, settings: &KafkaSettings) -> Result<Self, BrokerError> {
        let producer: FutureProducer = producer_config(broker, settings)
            .create()
            .map_err(transport)?;
        debug!("成功创建 {} 生产者", broker.group_id);
        Ok(Self {
            producer,
            timeout: settings.timeout,
        })
    }
}

impl Publish for KafkaSession {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let record = FutureRecord::<(), [u8]>::to(topic).payload(payload);
        self.producer
            .send(record, self.timeout)
            .await
            .map(
                |Delivery {
                     partition, offset, ..
                 }| {
                    debug!("消息写入主题 {topic} 分区 {partition} 偏移 {offset}");
                },
            )
            .map_err(|(e, _)| transport(e))
    }
}
