//! # 测试用内存消息代理
//!
//! 每个主题是一个只追加的日志，消费组偏移保存在代理中，
//! 同一消费组重新订阅时从上次位置继续。

use crate::{
    config::{BrokerConfig, OffsetReset},
    domain::{Broker, Poll, Publish, Record},
    errors::BrokerError,
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::time::{Duration, sleep};

#[derive(Default)]
struct State {
    logs: HashMap<String, Vec<Vec<u8>>>,
    offsets: HashMap<(String, String), usize>,
}

/// 内存消息代理
#[derive(Clone)]
pub struct MemoryBroker {
    config: Arc<BrokerConfig>,
    state: Arc<Mutex<State>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
    open_failures: Arc<AtomicUsize>,
}

impl MemoryBroker {
    /// 构造内存消息代理
    pub fn new(config: Arc<BrokerConfig>) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(State::default())),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
            open_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 共享日志、以另一配置（如不同消费组）访问的代理
    pub fn with_config(&self, config: Arc<BrokerConfig>) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    /// 令接下来 `n` 次发布失败
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// 令接下来 `n` 次打开发布会话失败
    pub fn fail_open(&self, n: usize) {
        self.open_failures.store(n, Ordering::SeqCst);
    }

    /// 直接向主题追加原始消息体
    pub fn append(&self, topic: &str, payload: impl Into<Vec<u8>>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .logs
            .entry(topic.to_owned())
            .or_default()
            .push(payload.into());
    }

    /// 主题中的全部消息体
    pub fn payloads(&self, topic: &str) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.logs.get(topic).cloned().unwrap_or_default()
    }

    /// 已打开的发布会话数
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// 已关闭的发布会话数
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Broker for MemoryBroker {
    type Session = MemorySession;
    type Receiver = MemoryReceiver;

    fn topic(&self) -> &str {
        &self.config.topic
    }

    fn open(&self) -> Result<MemorySession, BrokerError> {
        if take_one(&self.open_failures) {
            return Err("模拟打开会话失败".into());
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            broker: self.clone(),
        })
    }

    fn subscribe(&self, offset_reset: OffsetReset) -> Result<MemoryReceiver, BrokerError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let topic = self.config.topic.clone();
        let key = (self.config.group_id.clone(), topic.clone());
        let end = state.logs.get(&topic).map_or(0, Vec::len);
        state.offsets.entry(key.clone()).or_insert(match offset_reset {
            OffsetReset::Earliest => 0,
            OffsetReset::Latest => end,
        });
        Ok(MemoryReceiver {
            state: Arc::clone(&self.state),
            key,
        })
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// 内存发布会话，释放时计入关闭数
pub struct MemorySession {
    broker: MemoryBroker,
}

impl Publish for MemorySession {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        if take_one(&self.broker.failures) {
            return Err("模拟发布失败".into());
        }
        self.broker.append(topic, payload);
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.broker.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// 内存轮询会话
pub struct MemoryReceiver {
    state: Arc<Mutex<State>>,
    key: (String, String),
}

impl MemoryReceiver {
    fn next(&self) -> Option<Record> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let State { logs, offsets } = &mut *state;
        let offset = offsets.entry(self.key.clone()).or_default();
        let payload = logs.get(&self.key.1)?.get(*offset)?.clone();
        let record = Record {
            topic: self.key.1.clone(),
            partition: 0,
            offset: *offset as i64,
            payload: Some(payload),
        };
        *offset += 1;
        Some(record)
    }
}

impl Poll for MemoryReceiver {
    async fn poll(&mut self, wait: Duration) -> Result<Option<Record>, BrokerError> {
        if let Some(record) = self.next() {
            return Ok(Some(record));
        }
        sleep(wait).await;
        Ok(self.next())
    }
}
