//! Kafka 主题管理

use crate::{
    config::{KafkaSettings, admin_config},
    errors::TopicError,
};
use bridge::config::BrokerConfig;
use rdkafka::{
    admin::{AdminClient, AdminOptions, NewTopic, TopicReplication},
    client::DefaultClientContext,
    error::RDKafkaErrorCode,
};
use tracing::{debug, info};

/// 确保配置的主题存在，主题已存在视为成功
pub async fn ensure_topic(
    broker: &BrokerConfig,
    settings: &KafkaSettings,
    partitions: i32,
    replication: i32,
) -> Result<(), TopicError> {
    let admin: AdminClient<DefaultClientContext> = admin_config(broker).create()?;
    let opts = AdminOptions::new()
        .operation_timeout(Some(settings.timeout))
        .request_timeout(Some(settings.timeout));
    let topic = NewTopic::new(
        &broker.topic,
        partitions,
        TopicReplication::Fixed(replication),
    );

    debug!("开始创建主题 {}", broker.topic);
    for result in admin.create_topics(&[topic], &opts).await? {
        match result {
            Ok(name) => info!("成功创建主题 {name}"),
            Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => info!("主题 {name} 已存在"),
            Err((topic, code)) => return Err(TopicError::Create { topic, code }),
        }
    }
    Ok(())
}
