/// Key layout for the task store partitions.
///
/// Partition structure:
/// - `tasks`: task:{id} -> SwapTask (JSON)
/// - `order`: seq:{seq:020} -> id (string); zero-padded so lexicographic
///   iteration equals insertion order
/// - `metadata`: "next_seq" -> u64 (big-endian counter)

/// Encode a task key: task:{id}
pub fn encode_task_key(id: &str) -> Vec<u8> {
    format!("task:{}", id).into_bytes()
}

/// Encode an order key: seq:{seq:020}
pub fn encode_order_key(seq: u64) -> Vec<u8> {
    format!("seq:{:020}", seq).into_bytes()
}

/// Decode an order key back to its sequence number
pub fn decode_order_key(key: &[u8]) -> Option<u64> {
    let key_str = std::str::from_utf8(key).ok()?;
    key_str.strip_prefix("seq:")?.parse().ok()
}

pub const NEXT_SEQ_KEY: &[u8] = b"next_seq";
