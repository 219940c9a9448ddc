//! Order ticket rendering
//!
//! Self-contained printable HTML document: order + customer info, item
//! lines, payments, totals, and a QR code linking to the public tracking
//! page.

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, Luma};
use qrcode::QrCode;
use std::io::Cursor;

use crate::db::models::{Customer, Order, Payment, PricingMode};
use crate::utils::time;
use shared::{AppError, AppResult, ErrorCode};

/// Generate a QR code as base64-encoded PNG image
fn generate_qr_base64(data: &str) -> AppResult<String> {
    let code = QrCode::new(data)
        .map_err(|e| AppError::with_message(ErrorCode::ExportFailed, format!("QR encode: {e}")))?;
    let img = code.render::<Luma<u8>>().build();

    let dynamic_image = DynamicImage::ImageLuma8(img);
    let mut buffer = Cursor::new(Vec::new());
    dynamic_image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| AppError::with_message(ErrorCode::ExportFailed, format!("QR render: {e}")))?;

    Ok(general_purpose::STANDARD.encode(buffer.get_ref()))
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the printable ticket for one order
pub fn render_ticket(
    public_base_url: &str,
    order: &Order,
    customer: Option<&Customer>,
    payments: &[Payment],
) -> AppResult<String> {
    let tracking_url = format!(
        "{}/orders/{}",
        public_base_url.trim_end_matches('/'),
        order.order_number
    );
    let qr_base64 = generate_qr_base64(&tracking_url)?;
    let balance = order.total - order.paid;

    let mut item_rows = String::new();
    for item in &order.items {
        let mode = match item.pricing_mode {
            PricingMode::PerPiece => format!("x{}", item.point_multiplier.unwrap_or(1)),
            PricingMode::Flat => "flat".to_string(),
        };
        item_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{:.2}</td><td class=\"num\">{:.2}</td></tr>\n",
            escape_html(&item.name),
            mode,
            item.quantity,
            item.unit_price,
            item.line_total,
        ));
    }

    let mut payment_rows = String::new();
    if payments.is_empty() {
        payment_rows.push_str("<tr><td colspan=\"3\">No payments recorded.</td></tr>\n");
    } else {
        for (i, payment) in payments.iter().enumerate() {
            payment_rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td class=\"num\">{:.2}</td></tr>\n",
                i + 1,
                time::format_datetime(payment.created_at),
                payment.amount,
            ));
        }
    }

    let customer_block = match customer {
        Some(c) => format!(
            "<p>{}<br>{}<br>{}</p>",
            escape_html(&c.full_name()),
            escape_html(&c.phone),
            escape_html(&c.address),
        ),
        None => "<p>—</p>".to_string(),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Ticket {order_number}</title>
<style>
  body {{ font-family: monospace; max-width: 420px; margin: 0 auto; padding: 16px; }}
  h1 {{ text-align: center; font-size: 1.2em; }}
  table {{ width: 100%; border-collapse: collapse; margin: 8px 0; }}
  th, td {{ text-align: left; padding: 2px 4px; border-bottom: 1px dashed #999; }}
  td.num, th.num {{ text-align: right; }}
  .totals td {{ border: none; }}
  .qr {{ text-align: center; margin-top: 12px; }}
  .qr img {{ width: 120px; height: 120px; }}
  .muted {{ color: #555; font-size: 0.85em; text-align: center; }}
</style>
</head>
<body>
<h1>Laundry Back-Office</h1>
<p>Ticket: <strong>{order_number}</strong><br>Date: {created_at}</p>
{customer_block}
<table>
<thead><tr><th>Item</th><th>Pts</th><th>Qty</th><th class="num">Unit</th><th class="num">Total</th></tr></thead>
<tbody>
{item_rows}
</tbody>
</table>
<table>
<thead><tr><th>#</th><th>Payment date</th><th class="num">Amount</th></tr></thead>
<tbody>
{payment_rows}
</tbody>
</table>
<table class="totals">
<tr><td>Total</td><td class="num">{total:.2}</td></tr>
<tr><td>Paid</td><td class="num">{paid:.2}</td></tr>
<tr><td><strong>Balance</strong></td><td class="num"><strong>{balance:.2}</strong></td></tr>
</table>
<div class="qr"><img src="data:image/png;base64,{qr_base64}" alt="tracking QR"></div>
<p class="muted">Scan the QR code to track this order<br><a href="{tracking_url}">{tracking_url}</a></p>
</body>
</html>
"#,
        order_number = escape_html(&order.order_number),
        created_at = time::format_datetime(order.created_at),
        customer_block = customer_block,
        item_rows = item_rows,
        payment_rows = payment_rows,
        total = order.total,
        paid = order.paid,
        balance = balance,
        qr_base64 = qr_base64,
        tracking_url = escape_html(&tracking_url),
    );

    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        CareLevel, DeliveryType, OrderItem, OrderStatus, PaymentStatus, PricingMode,
    };
    use surrealdb::RecordId;

    fn sample_order() -> Order {
        Order {
            id: Some(RecordId::from_table_key("order", "t1")),
            order_number: "ORD-000007".to_string(),
            customer_id: RecordId::from_table_key("customer", "c1"),
            items: vec![OrderItem {
                price_item_id: RecordId::from_table_key("price_item", "p1"),
                name: "Heavy <blanket>".to_string(),
                pricing_mode: PricingMode::PerPiece,
                point_multiplier: Some(2),
                unit_price: 630.0,
                quantity: 1,
                line_total: 1260.0,
            }],
            status: OrderStatus::Received,
            total: 1260.0,
            paid: 0.0,
            payment_status: PaymentStatus::Pending,
            delivery_type: DeliveryType::Standard,
            care_level: CareLevel::Normal,
            note: None,
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_render_contains_order_data() {
        let order = sample_order();
        let html = render_ticket("http://localhost:5173", &order, None, &[]).unwrap();
        assert!(html.contains("ORD-000007"));
        assert!(html.contains("1260.00"));
        assert!(html.contains("No payments recorded."));
        assert!(html.contains("data:image/png;base64,"));
        assert!(html.contains("http://localhost:5173/orders/ORD-000007"));
    }

    #[test]
    fn test_render_escapes_html() {
        let order = sample_order();
        let html = render_ticket("http://localhost:5173", &order, None, &[]).unwrap();
        assert!(html.contains("Heavy &lt;blanket&gt;"));
        assert!(!html.contains("Heavy <blanket>"));
    }

    #[test]
    fn test_qr_base64_is_generated() {
        let b64 = generate_qr_base64("http://example.com/orders/ORD-000001").unwrap();
        assert!(!b64.is_empty());
        // PNG magic bytes survive the round trip
        let bytes = general_purpose::STANDARD.decode(&b64).unwrap();
        assert_eq!(&bytes[1..4], b"PNG".as_slice());
    }
}
