use std::collections::BTreeSet;

/// 标签最大长度（slug 之后）
pub const MAX_TAG_LENGTH: usize = 50;

/// 将单个标签规范化为小写 slug，空白标签返回 None
pub fn normalize_tag(tag: &str) -> Option<String> {
    let slug = slug::slugify(tag.trim());
    if slug.is_empty() {
        return None;
    }

    if slug.len() > MAX_TAG_LENGTH {
        let truncated: String = slug.chars().take(MAX_TAG_LENGTH).collect();
        return Some(truncated.trim_end_matches('-').to_string());
    }

    Some(slug)
}

/// 规范化标签集合：去空、去重、排序
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .filter_map(|t| normalize_tag(t.as_ref()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Rust"), Some("rust".to_string()));
        assert_eq!(normalize_tag("  Web Dev "), Some("web-dev".to_string()));
        assert_eq!(normalize_tag("C++ & Python!"), Some("c-python".to_string()));
        assert_eq!(normalize_tag("   "), None);
        assert_eq!(normalize_tag("---"), None);
    }

    #[test]
    fn test_normalize_tags_is_a_set() {
        let tags = normalize_tags(vec!["Rust", "rust", "", "axum", "RUST "]);
        assert_eq!(tags, vec!["axum".to_string(), "rust".to_string()]);
    }

    #[test]
    fn test_long_tags_are_truncated() {
        let long = "a".repeat(80);
        assert_eq!(normalize_tag(&long).map(|t| t.len()), Some(MAX_TAG_LENGTH));
    }
}
