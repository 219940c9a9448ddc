//! 导出模块
//!
//! 订单/支付快照的只读消费方：
//! - [`ticket`]: 可打印 HTML 小票，内嵌跟踪二维码
//! - [`payments_csv`]: 支付流水 CSV 导出

pub mod payments_csv;
pub mod ticket;
