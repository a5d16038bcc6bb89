use serde::{Deserialize, Serialize};

pub(crate) const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

impl PageQuery {
    /// Clamps to a non-negative offset and a limit in `1..=max`.
    pub(crate) fn bounded(self, max: i64) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(1, max))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

impl<T> PaginatedResponse<T> {
    pub(crate) fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            skip: self.skip,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_is_bounded() {
        let query = PageQuery { skip: -5, limit: 10_000 };
        assert_eq!(query.bounded(100), (0, 100));
        let query = PageQuery { skip: 20, limit: 0 };
        assert_eq!(query.bounded(100), (20, 1));
    }

    #[test]
    fn map_keeps_paging_metadata() {
        let page = PaginatedResponse { items: vec![1, 2], total_count: 7, skip: 2, limit: 2 };
        let mapped = page.map(|value| value * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!((mapped.total_count, mapped.skip, mapped.limit), (7, 2, 2));
    }
}
