//! Small shared utilities

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Format a sequence value as the human-facing order number.
///
/// Zero-padded to six digits ("ORD-000042"); distinct from the internal
/// record id.
pub fn format_order_number(seq: i64) -> String {
    format!("ORD-{:06}", seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_order_number() {
        assert_eq!(format_order_number(1), "ORD-000001");
        assert_eq!(format_order_number(42), "ORD-000042");
        assert_eq!(format_order_number(123456), "ORD-123456");
        // Overflow past six digits keeps the full value
        assert_eq!(format_order_number(1234567), "ORD-1234567");
    }
}
