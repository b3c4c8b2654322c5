//! JWT 校验工具
//!
//! 令牌由外部身份服务签发（共享密钥），本服务只做校验。Claims 自带
//! 身份属性（角色、班级），校验通过后不需要再查数据库。

use crate::config::AppConfig;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::models::users::entities::{User, UserRole};

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,                  // Subject (user ID)
    pub username: String,             // 用户名
    pub display_name: Option<String>, // 展示名
    pub role: UserRole,               // 用户角色
    pub cohort: Option<String>,       // 学生所在班级，辅导老师为空
    pub exp: usize,                   // Expiration time (时间戳)
    pub iat: usize,                   // Issued at (签发时间)
}

impl Claims {
    /// 转换为业务层使用的用户身份视图
    pub fn into_user(self) -> Option<User> {
        let id = self.sub.parse::<i64>().ok()?;
        Some(User {
            id,
            username: self.username,
            display_name: self.display_name,
            role: self.role,
            cohort: self.cohort,
        })
    }
}

pub struct JwtUtils;

impl JwtUtils {
    // 获取 JWT 密钥
    fn get_secret() -> String {
        AppConfig::get().jwt.secret.clone()
    }

    /// 验证 JWT token
    pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        Self::verify_token_with_secret(token, &Self::get_secret())
    }

    // 与配置解耦的校验入口，测试直接使用
    pub(crate) fn verify_token_with_secret(
        token: &str,
        secret: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(secret.as_ref());
        let validation = Validation::default();

        decode::<Claims>(token, &decoding_key, &validation).map(|token_data| token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-secret";

    fn token_for(claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap()
    }

    fn student_claims() -> Claims {
        let now = chrono::Utc::now().timestamp() as usize;
        Claims {
            sub: "200".to_string(),
            username: "zhang_wei".to_string(),
            display_name: Some("张伟".to_string()),
            role: UserRole::Student,
            cohort: Some("Grade 8".to_string()),
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_verify_roundtrip() {
        let claims = student_claims();
        let token = token_for(&claims);

        let verified = JwtUtils::verify_token_with_secret(&token, SECRET).unwrap();
        assert_eq!(verified.sub, "200");
        assert_eq!(verified.role, UserRole::Student);
        assert_eq!(verified.cohort.as_deref(), Some("Grade 8"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = token_for(&student_claims());
        assert!(JwtUtils::verify_token_with_secret(&token, "other-secret").is_err());
    }

    #[test]
    fn test_verify_rejects_expired() {
        let mut claims = student_claims();
        claims.exp = claims.iat - 7200;
        let token = token_for(&claims);
        assert!(JwtUtils::verify_token_with_secret(&token, SECRET).is_err());
    }

    #[test]
    fn test_claims_into_user() {
        let user = student_claims().into_user().unwrap();
        assert_eq!(user.id, 200);
        assert_eq!(user.username, "zhang_wei");

        let mut bad = student_claims();
        bad.sub = "not-a-number".to_string();
        assert!(bad.into_user().is_none());
    }
}
