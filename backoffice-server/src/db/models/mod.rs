//! Data models
//!
//! SurrealDB 实体与请求 DTO。所有 ID 使用 `table:id` 字符串格式序列化。

pub mod customer;
pub mod order;
pub mod payment;
pub mod price_item;
pub mod serde_helpers;
pub mod user;

// Re-exports
pub use customer::{Customer, CustomerCreate, CustomerUpdate};
pub use order::{
    CareLevel, DeliveryType, Order, OrderCreate, OrderItem, OrderItemInput, OrderItemsUpdate,
    OrderStatus, OrderUpdate, OrderWithCustomer, PaymentStatus,
};
pub use payment::{Payment, PaymentCreate, PaymentMethod};
pub use price_item::{PriceItem, PriceItemCreate, PriceItemUpdate, PricingMode};
pub use user::{Role, User, UserCreate, UserUpdate};
