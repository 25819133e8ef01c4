//! # **bridge** 发布/订阅桥接核心库
//!
//! 生产者按随机批次与间隔向主题发布消息，订阅者轮询主题、解码消息并交给处理器。

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod message;
pub mod publisher;
pub mod subscriber;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;


pub use context::{Context, shutdown_requested, shutdown_signal};
pub use message::Message;
