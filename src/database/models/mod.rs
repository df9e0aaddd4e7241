pub mod api_key;
pub mod api_usage;
pub mod payment;
pub mod plan;
pub mod purchase_quota;
pub mod role;
pub mod subscription;
pub mod tool;
pub mod user;
pub mod user_database;

use serde::Deserialize;

/// `?skip=&limit=` query parameters for list endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "Pagination::default_limit")]
    pub limit: i64,
}

impl Pagination {
    fn default_limit() -> i64 {
        100
    }

    /// Offset and limit clamped to sane bounds for SQL
    pub fn bounds(&self) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(1, 1000))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { skip: 0, limit: Self::default_limit() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamping() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.bounds(), (0, 100));

        let p = Pagination { skip: -5, limit: 10_000 };
        assert_eq!(p.bounds(), (0, 1000));
    }
}
