//! Laundry Back-Office Server
//!
//! # 架构概述
//!
//! 洗衣店后台管理服务，提供以下核心功能：
//!
//! - **订单** (`orders`): 订单生命周期、支付对账引擎
//! - **定价** (`pricing`): 价目表驱动的订单计价
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **HTTP API** (`api`): RESTful API 接口
//! - **导出** (`export`): 订单小票 / 支付流水导出
//!
//! # 模块结构
//!
//! ```text
//! backoffice-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、角色
//! ├── db/            # 数据库层 (models + repositories)
//! ├── pricing/       # 订单计价引擎
//! ├── orders/        # 对账引擎、订单互斥锁
//! ├── api/           # HTTP 路由和处理器
//! ├── export/        # 小票 / CSV 导出
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod export;
pub mod orders;
pub mod pricing;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use crate::core::{Config, Server, ServerState};
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
   _____           __
  / ___/__  ______/ /____
  \__ \/ / / / __  / ___/
 ___/ / /_/ / /_/ (__  )
/____/\__,_/\__,_/____/
  Back-Office Server
    "#
    );
}
