//! # 订阅者
//!
//! 在调用方任务上轮询主题，解码后交给处理器。轮询超时与传输错误都不会终止循环；
//! 解码失败按 [`DecodePolicy`] 停止或跳过。

use crate::{
    config::{DecodePolicy, SubscriberConfig},
    context::shutdown_requested,
    domain::{Handler, Poll, Record},
    errors::{BrokerError, CodecError},
    message::Message,
};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// 订阅循环停止原因
#[derive(Debug)]
pub enum Stopped {
    /// 收到关闭通知
    Shutdown,
    /// 遇到无法解码的消息
    Poisoned(CodecError),
}

/// 订阅循环结果
#[derive(Debug)]
pub struct Outcome {
    /// 停止原因
    pub stopped: Stopped,
    /// 已处理消息数
    pub handled: u64,
    /// 已跳过的无法解码消息数
    pub skipped: u64,
}

/// 单次轮询的结果
#[derive(Debug)]
pub enum Step {
    /// 没有消息
    Idle,
    /// 传输错误，已记录
    Failed,
    /// 消息已交给处理器
    Handled,
    /// 无法解码的消息已跳过
    Skipped,
    /// 无法解码的消息，订阅者应停止
    Poisoned(CodecError),
}

/// 订阅者结构
pub struct Subscriber<P: Poll> {
    session: P,
    cfg: SubscriberConfig,
    handled: u64,
    skipped: u64,
}

impl<P: Poll> Subscriber<P> {
    /// 以已订阅主题的轮询会话构造订阅者
    pub fn new(session: P, cfg: SubscriberConfig) -> Self {
        Self {
            session,
            cfg,
            handled: 0,
            skipped: 0,
        }
    }

    /// 轮询一次并处理结果
    pub async fn step<H: Handler>(&mut self, handler: &mut H) -> Step {
        let polled = self.session.poll(self.cfg.poll_wait()).await;
        self.dispatch(polled, handler).await
    }

    async fn dispatch<H: Handler>(
        &mut self,
        polled: Result<Option<Record>, BrokerError>,
        handler: &mut H,
    ) -> Step {
        let record = match polled {
            Ok(Some(record)) => record,
            Ok(None) | Err(BrokerError::Timeout) => return Step::Idle,
            Err(e) => {
                error!("消息错误：{e}");
                return Step::Failed;
            }
        };

        let payload = record.payload.as_deref().unwrap_or_default();
        match Message::from_bytes(payload) {
            Ok(msg) => {
                debug!(
                    "收到主题 {} 分区 {} 偏移 {} 的消息",
                    record.topic, record.partition, record.offset
                );
                handler.handle(msg).await;
                self.handled += 1;
                Step::Handled
            }
            Err(e) => {
                let raw = String::from_utf8_lossy(payload);
                match self.cfg.on_decode_error {
                    DecodePolicy::Stop => {
                        error!("主题 {} 的消息 '{raw}' 无法解码：{e}", record.topic);
                        Step::Poisoned(e)
                    }
                    DecodePolicy::Skip => {
                        self.skipped += 1;
                        warn!(
                            "跳过主题 {} 无法解码的消息 '{raw}'，累计 {} 条：{e}",
                            record.topic, self.skipped
                        );
                        Step::Skipped
                    }
                }
            }
        }
    }

    /// 运行订阅循环，直至收到关闭通知或按策略停止
    ///
    /// 轮询会话随订阅者一同在返回前释放。
    #[instrument(name = "subscribe_loop", skip_all)]
    pub async fn run<H: Handler>(
        mut self,
        mut handler: H,
        mut shutdown: watch::Receiver<bool>,
    ) -> Outcome {
        info!("启动订阅者");
        let stopped = loop {
            let polled = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => {
                    info!("收到关闭信号，开始优雅退出");
                    break Stopped::Shutdown;
                }
                polled = self.session.poll(self.cfg.poll_wait()) => polled,
            };
            if let Step::Poisoned(e) = self.dispatch(polled, &mut handler).await {
                break Stopped::Poisoned(e);
            }
        };
        info!(
            "订阅者停止，共处理 {} 条消息，跳过 {} 条",
            self.handled, self.skipped
        );
        Outcome {
            stopped,
            handled: self.handled,
            skipped: self.skipped,
        }
    }
}
