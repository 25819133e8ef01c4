use bridge::{
    Context,
    config::{BrokerConfig, PublisherConfig, build_config, config_root, get_config, load_section},
    errors::ConfigError,
    publisher::Publisher,
};
use bridge_kafka::{KafkaBroker, config::KafkaSettings};
use std::{process::ExitCode, sync::Arc};
use tracing::error;
use tracing_appender::non_blocking;
use tracing_subscriber::fmt;

fn load() -> Result<(Arc<BrokerConfig>, KafkaSettings, PublisherConfig), ConfigError> {
    let c = build_config(config_root())?;
    Ok((
        get_config()?,
        KafkaSettings::from_config(&c)?,
        load_section(&c, "publisher")?,
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
            error!("加载生产者配置失败：{e}");
            return ExitCode::FAILURE;
        }
    };

    let ctx = Context::new();
    ctx.watch();
    let broker = KafkaBroker::new(Arc::clone(&config), settings);
    match Publisher::new(broker, config, cfg) {
        Ok(publisher) => publisher.launch(&ctx).await,
        Err(e) => {
            error!("生产者配置无效：{e}");
            return ExitCode::FAILURE;
        }
    }
    ctx.all_done().await;
    ExitCode::SUCCESS
}
