use bridge::errors::BrokerError;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use thiserror::Error;

/// 主题管理错误
#[derive(Debug, Error)]
pub enum TopicError {
    #[error("Kafka错误：{0}")]
    Kafka(#[from] KafkaError),
    #[error("创建主题 {topic} 失败：{code}")]
    Create {
        topic: String,
        code: RDKafkaErrorCode,
    },
}

/// 将 Kafka 错误转换为消息代理错误，各类超时归为 [`BrokerError::Timeout`]
pub(crate) fn transport(e: KafkaError) -> BrokerError {
    match e.rdkafka_error_code() {
        Some(
            RDKafkaErrorCode::OperationTimedOut
            | RDKafkaErrorCode::RequestTimedOut
            | RDKafkaErrorCode::MessageTimedOut,
        ) => BrokerError::Timeout,
        _ => BrokerError::Transport(e.to_string()),
    }
}
