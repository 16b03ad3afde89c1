use crate::error::{AppError, Result};

/// 按配置的字符上限校验文本长度
pub fn validate_max_chars(field: &str, value: &str, max: usize) -> Result<()> {
    let count = value.chars().count();
    if count > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters (got {})",
            field, max, count
        )));
    }
    Ok(())
}

/// 校验非空文本（去除首尾空白后）
pub fn validate_not_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} cannot be blank", field)));
    }
    Ok(())
}

/// 搜索词规范化：去除控制字符与首尾空白并转小写，空串返回 None
///
/// 存储层用换行拼接标签，搜索词里不能带控制字符。
pub fn normalize_search_query(query: &str) -> Option<String> {
    let cleaned: String = query.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_max_chars_counts_characters() {
        assert!(validate_max_chars("bio", "你好世界", 4).is_ok());
        assert!(validate_max_chars("bio", "你好世界!", 4).is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("title", "  hi ").is_ok());
        assert!(matches!(validate_not_blank("title", " \n "), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_normalize_search_query() {
        assert_eq!(normalize_search_query("  RuSt "), Some("rust".to_string()));
        assert_eq!(normalize_search_query("   "), None);
    }

    #[test]
    fn test_search_query_drops_control_characters() {
        assert_eq!(normalize_search_query("Rust\nWeb"), Some("rustweb".to_string()));
        assert_eq!(normalize_search_query(" rust\t"), Some("rust".to_string()));
        assert_eq!(normalize_search_query("\n\t\r"), None);
    }
}
