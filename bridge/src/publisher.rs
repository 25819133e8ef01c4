//! # 生产者
//!
//! 自驱动的负载生成器：按随机批次生成消息并逐条发布，批次之间随机等待。
//! 单条消息发布失败只记录日志，不影响同批次其他消息。

use crate::{
    config::{BrokerConfig, PublisherConfig, SessionMode, validate_section},
    context::{Context, shutdown_requested},
    domain::{Broker, Publish},
    errors::{BridgeError, ConfigError},
    message::Message,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Arc;
use tokio::{
    sync::{Notify, watch},
    time::{Duration, sleep},
};
use tracing::{Span, debug, error, info, instrument};

/// 生成一批随机消息
///
/// 批次大小取自 `[batch_min, batch_max]`，消息 id 取自 `[0, id_bound)`。
/// `cfg` 须已通过验证。
pub fn generate_batch<R: Rng>(rng: &mut R, cfg: &PublisherConfig) -> Vec<Message> {
    let size = rng.gen_range(cfg.batch_min..=cfg.batch_max);
    (0..size)
        .map(|_| {
            let id = rng.gen_range(0..cfg.id_bound);
            let n: i64 = rng.gen_range(0..i64::MAX);
            Message::new(id, format!("This is message {n}"))
        })
        .collect()
}

/// 生产者结构
pub struct Publisher<B: Broker> {
    broker: B,
    config: Arc<BrokerConfig>,
    cfg: PublisherConfig,
    session: Option<B::Session>,
    rng: StdRng,
}

impl<B: Broker> Publisher<B> {
    /// 构造生产者，生产者配置未通过验证时返回 [`ConfigError::Validation`]
    pub fn new(
        broker: B,
        config: Arc<BrokerConfig>,
        cfg: PublisherConfig,
    ) -> Result<Self, ConfigError> {
        validate_section(&cfg, "publisher")?;
        Ok(Self {
            broker,
            config,
            cfg,
            session: None,
            rng: StdRng::from_entropy(),
        })
    }

    /// 指定随机数生成器
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// 生成下一批消息
    pub fn batch(&mut self) -> Vec<Message> {
        generate_batch(&mut self.rng, &self.cfg)
    }

    /// 发布单条消息
    pub async fn publish(&mut self, msg: &Message) -> Result<(), BridgeError> {
        let payload = msg.encode()?;
        let topic = self.broker.topic();
        match self.cfg.session {
            SessionMode::PerMessage => {
                let session = self.broker.open()?;
                debug!("打开发布会话");
                let result = session.publish(topic, payload.as_bytes()).await;
                drop(session);
                debug!("关闭发布会话");
                result?;
            }
            SessionMode::Shared => {
                let session = match self.session.take() {
                    Some(s) => s,
                    None => {
                        let s = self.broker.open()?;
                        info!("打开共享发布会话");
                        s
                    }
                };
                let session = self.session.insert(session);
                session.publish(topic, payload.as_bytes()).await?;
            }
        }
        info!("消息已发布：{payload}");
        Ok(())
    }

    /// 发布一批消息，返回成功发布的条数
    pub async fn publish_batch(&mut self, batch: &[Message]) -> usize {
        let mut published = 0;
        for msg in batch {
            match self.publish(msg).await {
                Ok(()) => published += 1,
                Err(e) => error!("发布消息 {msg} 失败：{e}"),
            }
        }
        published
    }

    fn delay(&mut self) -> Duration {
        match self.cfg.max_delay {
            0 => Duration::ZERO,
            max => Duration::from_millis(self.rng.gen_range(0..max)),
        }
    }

    /// 运行生产循环，直至收到关闭通知
    #[instrument(name = "publish_loop", skip_all, fields(topic, client_id))]
    pub async fn run(mut self, ready: Arc<Notify>, mut shutdown: watch::Receiver<bool>) {
        Span::current().record("topic", self.config.topic.as_str());
        Span::current().record("client_id", self.config.group_id.as_str());
        ready.notify_one();
        info!("启动生产者");
        loop {
            let batch = self.batch();
            debug!("生成 {} 条消息", batch.len());
            for msg in &batch {
                tokio::select! {
                    biased;
                    _ = shutdown_requested(&mut shutdown) => {
                        info!("收到关闭信号，开始优雅退出");
                        return;
                    }
                    result = self.publish(msg) => {
                        if let Err(e) = result {
                            error!("发布消息 {msg} 失败：{e}");
                        }
                    }
                }
            }

            let delay = self.delay();
            debug!("等待 {} 毫秒后生成下一批", delay.as_millis());
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => {
                    info!("收到关闭信号，开始优雅退出");
                    return;
                }
                _ = sleep(delay) => {}
            }
        }
    }

    /// 在上下文中启动生产者后台任务
    pub async fn launch(self, context: &Context) {
        context
            .spawn(move |ready, shutdown| self.run(ready, shutdown))
            .await;
    }
}
