use serde::{Deserialize, Serialize};

/// 标准API响应格式
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// 分页结果结构
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, total: usize, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = (total + per_page - 1) / per_page;
        Self {
            data,
            total,
            page,
            per_page,
            total_pages,
            has_more: page < total_pages,
        }
    }

    pub fn empty(page: usize, per_page: usize) -> Self {
        Self::new(Vec::new(), 0, page, per_page)
    }

    /// 1-based 页码对应的偏移量
    pub fn offset(page: usize, per_page: usize) -> usize {
        page.saturating_sub(1).saturating_mul(per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_math() {
        let page = PaginatedResult::new(vec![1, 2], 5, 1, 2);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_more);

        let last = PaginatedResult::new(vec![5], 5, 3, 2);
        assert!(!last.has_more);

        let empty: PaginatedResult<i32> = PaginatedResult::empty(1, 20);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);

        assert_eq!(PaginatedResult::<i32>::offset(1, 20), 0);
        assert_eq!(PaginatedResult::<i32>::offset(3, 20), 40);
    }
}
