use bridge::config::get_config;
use bridge_kafka::{config::KafkaSettings, topic::ensure_topic};
use std::process::ExitCode;
use tracing::error;
use tracing_appender::non_blocking;
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> ExitCode {
    let (non_blocking, _guard) = non_blocking(std::io::stdout());
    fmt()
        .with_writer(non_blocking)
        .with_target(false)
        .pretty()
        .init();

    let result = async {
        let config = get_config()?;
        let settings = KafkaSettings::load()?;
        Ok::<(), Box<dyn std::error::Error>>(ensure_topic(&config, &settings, 3, 1).await?)
    };
    match result.await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("初始化主题失败：{e}");
            ExitCode::FAILURE
        }
    }
}
