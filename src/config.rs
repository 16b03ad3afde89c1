use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_format: String,

    // Database configuration
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,

    // Content settings
    pub max_post_length: usize,
    pub max_comment_length: usize,
    pub max_bio_length: usize,
    pub default_posts_per_page: usize,
    pub max_page_size: usize,

    // Feature flags
    pub enable_comments: bool,

    // Rate limiting
    pub rate_limit_requests: u32,
    pub rate_limit_burst: u32,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "rainbow".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "social".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()?,

            max_post_length: env::var("MAX_POST_LENGTH")
                .unwrap_or_else(|_| "50000".to_string())
                .parse()?,
            max_comment_length: env::var("MAX_COMMENT_LENGTH")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
            max_bio_length: env::var("MAX_BIO_LENGTH")
                .unwrap_or_else(|_| "160".to_string())
                .parse()?,
            default_posts_per_page: env::var("DEFAULT_POSTS_PER_PAGE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            max_page_size: env::var("MAX_PAGE_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            enable_comments: env::var("ENABLE_COMMENTS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,

            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            rate_limit_burst: env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// `DATABASE_URL=memory` 使用进程内存储（开发与测试）
    pub fn uses_memory_store(&self) -> bool {
        self.database_url == "memory" || self.database_url.starts_with("mem://")
    }

    /// 将请求的分页参数规范化为 (page, per_page)，page 从 1 开始
    pub fn page_params(&self, page: Option<i32>, limit: Option<i32>) -> (usize, usize) {
        let page = page.unwrap_or(1).max(1) as usize;
        let per_page = limit
            .map(|l| l.max(1) as usize)
            .unwrap_or(self.default_posts_per_page)
            .min(self.max_page_size.max(1));
        (page, per_page)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            log_format: "pretty".to_string(),
            database_url: "memory".to_string(),
            database_namespace: "rainbow".to_string(),
            database_name: "social".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            jwt_secret: "rainbow-social-test-secret".to_string(),
            jwt_expiry_hours: 1,
            max_post_length: 50000,
            max_comment_length: 5000,
            max_bio_length: 160,
            default_posts_per_page: 20,
            max_page_size: 100,
            enable_comments: true,
            rate_limit_requests: 1000,
            rate_limit_burst: 100,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_are_clamped() {
        let config = Config::default();
        assert_eq!(config.page_params(None, None), (1, 20));
        assert_eq!(config.page_params(Some(0), Some(0)), (1, 1));
        assert_eq!(config.page_params(Some(-3), Some(500)), (1, 100));
        assert_eq!(config.page_params(Some(4), Some(7)), (4, 7));
    }

    #[test]
    fn test_memory_store_selection() {
        let mut config = Config::default();
        assert!(config.uses_memory_store());
        config.database_url = "http://localhost:8000".to_string();
        assert!(!config.uses_memory_store());
    }
}
