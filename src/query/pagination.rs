//! Pagination metadata derived from the executed query.

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationEnvelope {
    pub count: u64,
    pub current_offset: u64,
    pub current_page: u64,
    pub next_offset: Option<u64>,
    pub prev_offset: Option<u64>,
    pub total_pages: u64,
}

impl PaginationEnvelope {
    /// `limit` is always positive when it comes from the clause builder; zero is treated as one.
    pub fn new(count: u64, limit: u64, offset: u64) -> Self {
        let limit = limit.max(1);
        PaginationEnvelope {
            count,
            current_offset: offset,
            current_page: (offset / limit).saturating_add(1),
            next_offset: offset.checked_add(limit).filter(|&next| next < count),
            prev_offset: offset.checked_sub(limit),
            total_pages: count.div_ceil(limit),
        }
    }

    /// JSON:API style `{ page: { number, size } }` for the next and previous pages, or null.
    pub fn page_links(&self, limit: u64) -> Value {
        let limit = limit.max(1);
        let page = |offset: Option<u64>| match offset {
            Some(o) => json!({ "page": { "number": (o / limit).saturating_add(1), "size": limit } }),
            None => Value::Null,
        };
        json!({
            "next": page(self.next_offset),
            "prev": page(self.prev_offset),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page() {
        let p = PaginationEnvelope::new(45, 20, 20);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.next_offset, Some(40));
        assert_eq!(p.prev_offset, Some(0));
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.count, 45);
        assert_eq!(p.current_offset, 20);
    }

    #[test]
    fn first_and_last_pages() {
        let first = PaginationEnvelope::new(45, 20, 0);
        assert_eq!(first.prev_offset, None);
        assert_eq!(first.next_offset, Some(20));

        let last = PaginationEnvelope::new(45, 20, 40);
        assert_eq!(last.next_offset, None);
        assert_eq!(last.current_page, 3);
    }

    #[test]
    fn empty_result() {
        let p = PaginationEnvelope::new(0, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.next_offset, None);
    }

    #[test]
    fn serializes_camel_case_with_nulls() {
        let v = serde_json::to_value(PaginationEnvelope::new(10, 20, 0)).unwrap();
        assert_eq!(
            v,
            json!({ "count": 10, "currentOffset": 0, "currentPage": 1, "nextOffset": null, "prevOffset": null, "totalPages": 1 })
        );
    }

    #[test]
    fn huge_offset_saturates() {
        let p = PaginationEnvelope::new(10, 20, u64::MAX);
        assert_eq!(p.next_offset, None);
        assert_eq!(p.current_page, u64::MAX / 20 + 1);
        assert_eq!(p.prev_offset, Some(u64::MAX - 20));

        let p = PaginationEnvelope::new(10, u64::MAX, 0);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.next_offset, None);
        assert_eq!(p.total_pages, 1);

        let p = PaginationEnvelope::new(10, 1, u64::MAX);
        assert_eq!(p.current_page, u64::MAX);
        assert_eq!(p.page_links(1)["prev"]["page"]["number"], u64::MAX);
    }

    #[test]
    fn links_point_at_neighbour_pages() {
        let p = PaginationEnvelope::new(45, 20, 20);
        assert_eq!(
            p.page_links(20),
            json!({ "next": { "page": { "number": 3, "size": 20 } }, "prev": { "page": { "number": 1, "size": 20 } } })
        );
    }
}
