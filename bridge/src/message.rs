//! # 消息信封
//!
//! 线上格式为 JSON 对象 `{"id": <整数>, "data": <字符串>}`。

use crate::errors::CodecError;
use serde::{Deserialize, Serialize, de::Error};
use serde_json::Value;
use std::fmt;

/// 消息结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// 消息 Id，唯一性由调用方负责
    #[serde(alias = "Id")]
    pub id: i64,
    /// 消息数据
    #[serde(alias = "Data")]
    pub data: String,
}

impl Message {
    /// 构造消息
    pub fn new(id: i64, data: impl Into<String>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    /// 编码为信封文本
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encoding)
    }

    /// 从信封文本解码
    pub fn decode(text: &str) -> Result<Self, CodecError> {
        Self::from_value(serde_json::from_str(text).map_err(CodecError::Decoding)?)
    }

    /// 从消息体字节解码
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::from_value(serde_json::from_slice(bytes).map_err(CodecError::Decoding)?)
    }

    // 结构体反序列化也接受数组形式，信封只认对象
    fn from_value(value: Value) -> Result<Self, CodecError> {
        if !value.is_object() {
            return Err(CodecError::Decoding(serde_json::Error::custom(
                "消息信封必须是 JSON 对象",
            )));
        }
        serde_json::from_value(value).map_err(CodecError::Decoding)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{id: {}, data: {}}}", self.id, self.data)
    }
}
