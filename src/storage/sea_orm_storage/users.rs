//! 用户存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::prelude::Users;
use crate::entity::users::Column;
use crate::errors::{Result, TuitionSystemError};
use crate::models::users::entities::User;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

impl SeaOrmStorage {
    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 批量获取用户，返回 id -> User 映射
    pub async fn get_users_by_ids_impl(&self, ids: &[i64]) -> Result<HashMap<i64, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = Users::find()
            .filter(Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(|e| TuitionSystemError::database_operation(format!("批量查询用户失败: {e}")))?;

        Ok(users.into_iter().map(|m| (m.id, m.into_user())).collect())
    }
}
