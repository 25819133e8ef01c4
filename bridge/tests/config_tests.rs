use bridge::{
    config::{
        BOOTSTRAP_ENV, BrokerConfig, DEFAULT_GROUP_ID, DEFAULT_TOPIC, DecodePolicy, OffsetReset,
        PublisherConfig, SessionMode, SubscriberConfig, load_section,
    },
    errors::ConfigError,
};
use config::{Config, Environment, File, FileFormat, Map};
use rstest::*;

fn from_env(vars: &[(&str, &str)]) -> Config {
    let source: Map<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::builder()
        .add_source(
            Environment::with_prefix("KAFKA")
                .prefix_separator("_")
                .separator("__")
                .source(Some(source)),
        )
        .build()
        .unwrap()
}

fn from_toml(text: &str) -> Config {
    Config::builder()
        .add_source(File::from_str(text, FileFormat::Toml))
        .build()
        .unwrap()
}

#[test]
fn bootstrap_from_env_with_defaults() {
    let config = from_env(&[("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092")]);
    let cfg = BrokerConfig::from_config(&config).unwrap();
    assert_eq!(
        cfg,
        BrokerConfig::new("localhost:9092", DEFAULT_TOPIC, DEFAULT_GROUP_ID)
    );
}

#[test]
fn env_overrides_topic_and_group() {
    let config = from_env(&[
        ("KAFKA_BOOTSTRAP_SERVERS", "b1:9092,b2:9092"),
        ("KAFKA_TOPIC", "T"),
        ("KAFKA_GROUP_ID", "grp"),
    ]);
    let cfg = BrokerConfig::from_config(&config).unwrap();
    assert_eq!(cfg, BrokerConfig::new("b1:9092,b2:9092", "T", "grp"));
}

#[rstest]
#[case::absent(&[])]
#[case::empty(&[("KAFKA_BOOTSTRAP_SERVERS", "")])]
#[case::blank(&[("KAFKA_BOOTSTRAP_SERVERS", "   ")])]
#[case::unrelated(&[("BOOTSTRAP_SERVERS", "localhost")])]
fn missing_bootstrap_is_an_error(#[case] vars: &[(&str, &str)]) {
    let config = from_env(vars);
    match BrokerConfig::from_config(&config) {
        Err(ConfigError::MissingBootstrap(var)) => assert_eq!(var, BOOTSTRAP_ENV),
        other => panic!("预期缺少服务地址错误，实际为 {other:?}"),
    }
}

#[test]
fn missing_bootstrap_names_the_variable() {
    let err = BrokerConfig::from_config(&from_env(&[])).unwrap_err();
    assert!(err.to_string().contains("KAFKA_BOOTSTRAP_SERVERS"));
}

#[test]
fn broker_from_file() {
    let config = from_toml(
        r#"
        bootstrap_servers = "kafka:9092"
        topic = "orders"
        "#,
    );
    let cfg = BrokerConfig::from_config(&config).unwrap();
    assert_eq!(cfg, BrokerConfig::new("kafka:9092", "orders", DEFAULT_GROUP_ID));
}

#[test]
fn sections_default_when_absent() {
    let config = from_toml("");
    let publisher: PublisherConfig = load_section(&config, "publisher").unwrap();
    assert_eq!(publisher.batch_min, 1);
    assert_eq!(publisher.batch_max, 10);
    assert_eq!(publisher.id_bound, 1000);
    assert_eq!(publisher.max_delay, 3000);
    assert_eq!(publisher.session, SessionMode::Shared);

    let subscriber: SubscriberConfig = load_section(&config, "subscriber").unwrap();
    assert_eq!(subscriber.poll_timeout, 1000);
    assert_eq!(subscriber.offset_reset, OffsetReset::Earliest);
    assert_eq!(subscriber.on_decode_error, DecodePolicy::Stop);
}

#[test]
fn sections_from_file() {
    let config = from_toml(
        r#"
        [publisher]
        max_delay = 0
        session = "per_message"

        [subscriber]
        poll_timeout = 250
        offset_reset = "latest"
        on_decode_error = "skip"
        "#,
    );
    let publisher: PublisherConfig = load_section(&config, "publisher").unwrap();
    assert_eq!(publisher.max_delay, 0);
    assert_eq!(publisher.batch_max, 10);
    assert_eq!(publisher.session, SessionMode::PerMessage);

    let subscriber: SubscriberConfig = load_section(&config, "subscriber").unwrap();
    assert_eq!(subscriber.poll_wait().as_millis(), 250);
    assert_eq!(subscriber.offset_reset.as_str(), "latest");
    assert_eq!(subscriber.on_decode_error, DecodePolicy::Skip);
}

#[rstest]
#[case::inverted_batch("[publisher]\nbatch_min = 5\nbatch_max = 2")]
#[case::zero_batch("[publisher]\nbatch_min = 0")]
#[case::zero_bound("[publisher]\nid_bound = 0")]
fn invalid_publisher_section(#[case] text: &str) {
    let result = load_section::<PublisherConfig>(&from_toml(text), "publisher");
    assert!(matches!(
        result,
        Err(ConfigError::Validation { ref section, .. }) if section == "publisher"
    ));
}

#[test]
fn invalid_subscriber_section() {
    let result =
        load_section::<SubscriberConfig>(&from_toml("[subscriber]\npoll_timeout = 0"), "subscriber");
    assert!(matches!(result, Err(ConfigError::Validation { .. })));

    let result = load_section::<SubscriberConfig>(
        &from_toml("[subscriber]\non_decode_error = \"retry\""),
        "subscriber",
    );
    assert!(matches!(result, Err(ConfigError::Load(_))));
}
