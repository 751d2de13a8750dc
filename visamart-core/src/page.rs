use serde::{Deserialize, Serialize};

/// One page of a listing plus the totals the client needs for paging UI.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            items,
            total,
            page,
            pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            pages: self.pages,
        }
    }
}

/// Raw paging parameters as they arrive from the client.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    /// Resolve to a concrete (page, limit) pair, clamped to server limits.
    pub fn resolve(&self, default_limit: i64, max_limit: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit);
        (page, limit)
    }

    pub fn offset(page: i64, limit: i64) -> i64 {
        (page - 1) * limit
    }
}
