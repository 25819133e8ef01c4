use bridge::{
    Context,
    config::{
        BrokerConfig, SubscriberConfig, build_config, config_root, get_config, load_section,
        set_config,
    },
    domain::Broker,
    errors::ConfigError,
    message::Message,
    subscriber::{Stopped, Subscriber},
};
use bridge_kafka::{KafkaBroker, config::KafkaSettings};
use std::{process::ExitCode, sync::Arc};
use tracing::{error, info};
use tracing_appender::non_blocking;
use tracing_subscriber::fmt;

const GROUP_ID: &str = "software-concepts-guide/subscriber";

/// 以订阅者自己的消费组覆盖全局配置
fn load() -> Result<(Arc<BrokerConfig>, KafkaSettings, SubscriberConfig), ConfigError> {
    let base = get_config()?;
    set_config(BrokerConfig {
        group_id: GROUP_ID.to_owned(),
        ..BrokerConfig::clone(&base)
    });
    let c = build_config(config_root())?;
    Ok((
        get_config()?,
        KafkaSettings::from_config(&c)?,
        load_section(&c, "subscriber")?,
    ))
}

#[tokio::main]
async fn main() -> ExitCode {
    let (non_blocking, _guard) = non_blocking(std::io::stdout());
    fmt()
        .with_writer(non_blocking)
        .with_target(false)
        .pretty()
        .init();

    let (config, settings, cfg) = match load() {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("加载订阅者配置失败：{e}");
            return ExitCode::FAILURE;
        }
    };

    let broker = KafkaBroker::new(Arc::clone(&config), settings);
    let receiver = match broker.subscribe(cfg.offset_reset) {
        Ok(receiver) => receiver,
        Err(e) => {
            error!("订阅主题 {} 失败：{e}", config.topic);
            return ExitCode::FAILURE;
        }
    };

    let ctx = Context::new();
    ctx.watch();
    let handler = |msg: Message| info!("处理消息 {msg}");
    let outcome = Subscriber::new(receiver, cfg)
        .run(handler, ctx.notifier())
        .await;
    info!(
        "订阅者退出，处理 {} 条消息，跳过 {} 条",
        outcome.handled, outcome.skipped
    );
    match outcome.stopped {
        Stopped::Shutdown => ExitCode::SUCCESS,
        Stopped::Poisoned(e) => {
            error!("订阅者因无法解码的消息停止：{e}");
            ExitCode::FAILURE
        }
    }
}
