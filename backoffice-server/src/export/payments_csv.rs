//! Payments CSV export

use std::collections::HashMap;

use crate::db::models::Payment;
use crate::utils::time;
use shared::{AppError, AppResult, ErrorCode};

fn export_err(e: impl std::fmt::Display) -> AppError {
    AppError::with_message(ErrorCode::ExportFailed, format!("CSV write: {e}"))
}

/// Serialize payments into a CSV document
///
/// `order_numbers` maps order record ids to their human-facing numbers;
/// unknown orders render as an empty cell.
pub fn write_payments_csv(
    payments: &[Payment],
    order_numbers: &HashMap<String, String>,
) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["payment_id", "order_number", "amount", "method", "date"])
        .map_err(export_err)?;

    for payment in payments {
        let payment_id = payment
            .id
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_default();
        let order_number = order_numbers
            .get(&payment.order_id.to_string())
            .cloned()
            .unwrap_or_default();
        writer
            .write_record([
                payment_id,
                order_number,
                format!("{:.2}", payment.amount),
                payment.method.as_str().to_string(),
                time::format_date(payment.created_at),
            ])
            .map_err(export_err)?;
    }

    let bytes = writer.into_inner().map_err(export_err)?;
    String::from_utf8(bytes).map_err(export_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PaymentMethod;
    use surrealdb::RecordId;

    #[test]
    fn test_csv_layout() {
        let order_id = RecordId::from_table_key("order", "o1");
        let payments = vec![Payment {
            id: Some(RecordId::from_table_key("payment", "p1")),
            order_id: order_id.clone(),
            amount: 1890.0,
            method: PaymentMethod::Cash,
            created_at: 1_700_000_000_000,
        }];
        let mut numbers = HashMap::new();
        numbers.insert(order_id.to_string(), "ORD-000001".to_string());

        let csv = write_payments_csv(&payments, &numbers).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "payment_id,order_number,amount,method,date"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("ORD-000001"));
        assert!(row.contains("1890.00"));
        assert!(row.contains("CASH"));
    }

    #[test]
    fn test_unknown_order_renders_empty() {
        let payments = vec![Payment {
            id: None,
            order_id: RecordId::from_table_key("order", "ghost"),
            amount: 10.0,
            method: PaymentMethod::Transfer,
            created_at: 0,
        }];
        let csv = write_payments_csv(&payments, &HashMap::new()).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(",,"));
    }
}
