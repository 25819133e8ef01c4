use bridge::{
    config::{BrokerConfig, OffsetReset, PublisherConfig, SessionMode, SubscriberConfig},
    domain::{Broker, Publish},
    message::Message,
    publisher::Publisher,
    subscriber::{Step, Subscriber},
};
use bridge_kafka::{KafkaBroker, config::KafkaSettings, topic::ensure_topic};
use futures::future::try_join_all;
use std::sync::{Arc, LazyLock};
use tokio::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::fmt;
use uuid::Uuid;

static BOOTSTRAP: LazyLock<String> = LazyLock::new(|| {
    let _ = fmt().with_test_writer().with_max_level(Level::DEBUG).try_init();
    info!("启用 {} 测试日志输出", Level::DEBUG);
    std::env::var("KAFKA_BOOTSTRAP_SERVERS").unwrap_or_else(|_| "localhost:9092".to_owned())
});

fn settings() -> KafkaSettings {
    KafkaSettings {
        timeout: Duration::from_secs(15),
        ..KafkaSettings::default()
    }
}

async fn setup() -> Arc<BrokerConfig> {
    let config = BrokerConfig::new(
        BOOTSTRAP.as_str(),
        Uuid::new_v4().to_string(),
        Uuid::new_v4().to_string(),
    );
    ensure_topic(&config, &settings(), 1, 1).await.unwrap();
    Arc::new(config)
}

async fn consume(broker: &KafkaBroker, expected: usize) -> Vec<Message> {
    let receiver = broker.subscribe(OffsetReset::Earliest).unwrap();
    let mut subscriber = Subscriber::new(receiver, SubscriberConfig::default());
    let mut received = Vec::new();
    let mut handler = |msg: Message| received.push(msg);
    let mut handled = 0;
    for _ in 0..60 {
        match subscriber.step(&mut handler).await {
            Step::Handled => handled += 1,
            Step::Poisoned(e) => panic!("{e}"),
            _ => {}
        }
        if handled >= expected {
            break;
        }
    }
    received
}

#[tokio::test]
#[ignore = "需要可访问的Kafka集群"]
async fn ensure_topic_is_idempotent() {
    let config = setup().await;
    assert!(ensure_topic(&config, &settings(), 1, 1).await.is_ok());
}

#[tokio::test]
#[ignore = "需要可访问的Kafka集群"]
async fn publish_then_consume() {
    let config = setup().await;
    let broker = KafkaBroker::new(Arc::clone(&config), settings());
    let mut publisher = Publisher::new(
        KafkaBroker::new(Arc::clone(&config), settings()),
        config,
        PublisherConfig::default(),
    )
    .unwrap();
    publisher.publish(&Message::new(42, "hello")).await.unwrap();

    let received = consume(&broker, 1).await;
    assert_eq!(received, vec![Message::new(42, "hello")]);
}

#[tokio::test]
#[ignore = "需要可访问的Kafka集群"]
async fn publish_per_message() {
    let config = setup().await;
    let broker = KafkaBroker::new(Arc::clone(&config), settings());
    let cfg = PublisherConfig {
        session: SessionMode::PerMessage,
        ..PublisherConfig::default()
    };
    let mut publisher = Publisher::new(
        KafkaBroker::new(Arc::clone(&config), settings()),
        config,
        cfg,
    )
    .unwrap();
    let batch = publisher.batch();
    assert_eq!(publisher.publish_batch(&batch).await, batch.len());

    let received = consume(&broker, batch.len()).await;
    assert_eq!(received, batch);
}

#[tokio::test]
#[ignore = "需要可访问的Kafka集群"]
async fn shared_session_publishes_concurrently() {
    let config = setup().await;
    let broker = KafkaBroker::new(Arc::clone(&config), settings());
    let session = broker.open().unwrap();
    let payloads: Vec<String> = (0..5)
        .map(|id| Message::new(id, format!("This is message {id}")).encode().unwrap())
        .collect();
    try_join_all(
        payloads
            .iter()
            .map(|p| session.publish(&config.topic, p.as_bytes())),
    )
    .await
    .unwrap();

    let mut received = consume(&broker, payloads.len()).await;
    received.sort_by_key(|m| m.id);
    assert_eq!(received.len(), payloads.len());
    assert_eq!(received[0], Message::new(0, "This is message 0"));
}
