//! Wire-level packet types (spec §3 "LogPacket", §6 "Ingest wire protocol").
//!
//! The core only ever reads `messages.len()`; everything else is carried
//! opaquely so it can be forwarded to the chosen analyzer unmodified.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One log line within a packet. The core never inspects these fields; they
/// exist so the type round-trips through JSON without losing data the
/// analyzer needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: String,
    pub message: String,
    #[serde(flatten)]
    pub extra: std::collections::BTreeMap<String, Value>,
}

/// An ingested batch of log messages sharing provenance. Never split across
/// analyzers (spec I2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPacket {
    #[serde(rename = "packetId")]
    pub packet_id: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
    pub messages: Vec<LogMessage>,

    /// Accepted and ignored by the core (spec §6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Value>,
    #[serde(rename = "totalMessages", default, skip_serializing_if = "Option::is_none")]
    pub total_messages: Option<Value>,
}

impl LogPacket {
    pub fn message_count(&self) -> u64 {
        self.messages.len() as u64
    }
}
