//! # Kafka 轮询会话

use crate::{
    config::{KafkaSettings, consumer_config},
    errors::transport,
};
use bridge::{
    config::{BrokerConfig, OffsetReset},
    domain::{Poll, Record},
    errors::BrokerError,
};
use rdkafka::{
    Message,
    consumer::{Consumer, StreamConsumer},
};
use tokio::time::{Duration, timeout};
use tracing::info;

/// Kafka 轮询会话，释放时取消订阅
pub struct KafkaReceiver {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaReceiver {
    /// 以消费组身份订阅主题
    ///
    /// 消费组没有已提交偏移时，从 `offset_reset` 指定的位置开始。
    pub fn subscribe(
        broker: &BrokerConfig,
        settings: &KafkaSettings,
        offset_reset: OffsetReset,
    ) -> Result<Self, BrokerError> {
        let consumer: StreamConsumer = consumer_config(broker, settings, offset_reset)
            .create()
            .map_err(transport)?;
        consumer
            .subscribe(&[broker.topic.as_str()])
            .map_err(transport)?;
        info!("消费组 {} 成功订阅 {} 主题", broker.group_id, broker.topic);
        Ok(Self {
            consumer,
            topic: broker.topic.clone(),
        })
    }
}

impl Poll for KafkaReceiver {
    async fn poll(&mut self, wait: Duration) -> Result<Option<Record>, BrokerError> {
        match timeout(wait, self.consumer.recv()).await {
            Err(_) => Ok(None),
            Ok(Ok(msg)) => Ok(Some(Record {
                topic: msg.topic().to_owned(),
                partition: msg.partition(),
                offset: msg.offset(),
                payload: msg.payload().map(<[u8]>::to_vec),
            })),
            Ok(Err(e)) => Err(transport(e)),
        }
    }
}

impl Drop for KafkaReceiver {
    fn drop(&mut self) {
        self.consumer.unsubscribe();
        info!("释放 {} 主题订阅会话", self.topic);
    }
}
