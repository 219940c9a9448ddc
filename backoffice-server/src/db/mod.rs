//! Database Module
//!
//! 嵌入式 SurrealDB：schema 定义、首次启动种子数据、repository 层。

pub mod models;
pub mod repository;

use shared::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::db::models::{Role, User};
use crate::db::repository::UserRepository;

const NAMESPACE: &str = "laundry";
const DATABASE: &str = "backoffice";

/// Database service: owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open the on-disk database (RocksDB engine)
    pub async fn open(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;
        tracing::info!(path = %db_path, "Database connection established");
        Self::setup(db).await
    }

    /// Open an in-memory database (tests and tooling)
    pub async fn memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;
        Self::setup(db).await
    }

    async fn setup(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_schema(&db).await?;

        Ok(Self { db })
    }

    /// 首次启动时创建管理员账户（已存在则跳过）
    pub async fn ensure_default_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        let users = UserRepository::new(self.db.clone());
        if users.find_by_email(email).await?.is_some() {
            return Ok(());
        }

        let hash_pass = User::hash_password(password)
            .map_err(|e| AppError::internal(format!("Failed to hash admin password: {e}")))?;
        users.create_raw(email, "Admin", "", &hash_pass, Role::Admin).await?;
        tracing::info!(email = %email, "Seeded default admin account");
        Ok(())
    }
}

/// Idempotent schema definition
///
/// Unique constraints:
/// - `price_item.name`: catalog names are the upsert key
/// - `order.order_number`: sequence-backed human-facing number
/// - `user.email`
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        r#"
        DEFINE INDEX IF NOT EXISTS uniq_price_item_name ON TABLE price_item FIELDS name UNIQUE;
        DEFINE INDEX IF NOT EXISTS uniq_order_number ON TABLE order FIELDS order_number UNIQUE;
        DEFINE INDEX IF NOT EXISTS uniq_user_email ON TABLE user FIELDS email UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_payment_order ON TABLE payment FIELDS order_id;
        DEFINE INDEX IF NOT EXISTS idx_order_customer ON TABLE order FIELDS customer_id;
        "#,
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;
    Ok(())
}
