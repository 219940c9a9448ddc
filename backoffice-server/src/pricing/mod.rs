//! 订单计价引擎
//!
//! 纯函数：给定已解析的订单条目集合计算订单总额。
//! 目录解析（I/O）发生在 `orders` 模块，这里只做算术。

pub mod calculator;

pub use calculator::{
    MAX_PAYMENT_AMOUNT, MAX_QUANTITY, MAX_UNIT_PRICE, line_total, order_total, round_money,
};
