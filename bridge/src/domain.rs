//! # **bridge** 领域接口
//!
//! 消息代理客户端需要实现的发布、轮询与订阅能力，以及消息处理器。

use crate::{config::OffsetReset, errors::BrokerError, message::Message};
use std::future::{Future, ready};
use tokio::time::Duration;

/// 轮询得到的消息记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 主题
    pub topic: String,
    /// 分区
    pub partition: i32,
    /// 偏移
    pub offset: i64,
    /// 消息体
    pub payload: Option<Vec<u8>>,
}

/// 发布会话
pub trait Publish: Send + Sync + 'static {
    /// 将消息体提交到主题
    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), BrokerError>> + Send;
}

/// 轮询会话
pub trait Poll: Send + 'static {
    /// 在限定时间内获取下一条消息记录
    ///
    /// 超时返回 `Ok(None)` 或 [`BrokerError::Timeout`]。
    fn poll(
        &mut self,
        wait: Duration,
    ) -> impl Future<Output = Result<Option<Record>, BrokerError>> + Send;
}

/// 消息代理客户端
pub trait Broker: Send + Sync + 'static {
    /// 发布会话类型
    type Session: Publish;
    /// 轮询会话类型
    type Receiver: Poll;

    /// 主题
    fn topic(&self) -> &str;

    /// 打开发布会话
    fn open(&self) -> Result<Self::Session, BrokerError>;

    /// 以消费组身份订阅主题
    fn subscribe(&self, offset_reset: OffsetReset) -> Result<Self::Receiver, BrokerError>;
}

/// 消息处理器
pub trait Handler: Send {
    /// 处理一条解码后的消息
    fn handle(&mut self, msg: Message) -> impl Future<Output = ()> + Send;
}

impl<F> Handler for F
where
    F: FnMut(Message) + Send,
{
    #[inline(always)]
    fn handle(&mut self, msg: Message) -> impl Future<Output = ()> + Send {
        self(msg);
        ready(())
    }
}
