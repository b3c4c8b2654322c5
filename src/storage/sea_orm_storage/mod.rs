//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod submissions;
mod users;

use crate::config::AppConfig;
use crate::errors::{Result, TuitionSystemError};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| TuitionSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| TuitionSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| TuitionSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(TuitionSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, memory://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{
    assignments::{entities::Assignment, requests::CreateAssignmentRequest},
    submissions::entities::{
        GradeDraft, ResubmissionDraft, Submission, SubmissionDraft, SubmissionTally,
    },
    users::entities::User,
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, User>> {
        self.get_users_by_ids_impl(ids).await
    }

    // 作业模块
    async fn create_assignment(
        &self,
        owner_id: i64,
        req: CreateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        self.create_assignment_impl(owner_id, req, now).await
    }

    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(assignment_id).await
    }

    async fn list_assignments_for_class(&self, audience_class: &str) -> Result<Vec<Assignment>> {
        self.list_assignments_for_class_impl(audience_class).await
    }

    async fn list_assignments_by_owner(&self, owner_id: i64) -> Result<Vec<Assignment>> {
        self.list_assignments_by_owner_impl(owner_id).await
    }

    async fn tally_submissions(
        &self,
        assignment_ids: &[i64],
    ) -> Result<HashMap<i64, SubmissionTally>> {
        self.tally_submissions_impl(assignment_ids).await
    }

    // 提交模块
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    async fn get_submission_for_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        self.get_submission_for_student_impl(assignment_id, student_id)
            .await
    }

    async fn list_submissions_for_student(
        &self,
        student_id: i64,
        assignment_ids: &[i64],
    ) -> Result<Vec<Submission>> {
        self.list_submissions_for_student_impl(student_id, assignment_ids)
            .await
    }

    async fn list_submissions_for_assignment(
        &self,
        assignment_id: i64,
        page: u64,
        size: u64,
    ) -> Result<(Vec<Submission>, u64)> {
        self.list_submissions_for_assignment_impl(assignment_id, page, size)
            .await
    }

    async fn insert_submission(&self, draft: SubmissionDraft) -> Result<Submission> {
        self.insert_submission_impl(draft).await
    }

    async fn revise_submission_if_ungraded(
        &self,
        submission_id: i64,
        draft: ResubmissionDraft,
    ) -> Result<Option<Submission>> {
        self.revise_submission_if_ungraded_impl(submission_id, draft)
            .await
    }

    async fn grade_submission_if_ungraded(
        &self,
        submission_id: i64,
        draft: GradeDraft,
    ) -> Result<Option<Submission>> {
        self.grade_submission_if_ungraded_impl(submission_id, draft)
            .await
    }
}
