use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize, ToSchema, IntoParams, Default, Clone)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Returns `(page, limit, offset)`.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(limit);
        (page, limit, offset)
    }
}
/// `ILIKE` pattern matching `search` anywhere, with `%`, `_` and `\` taken literally.
/// `ILIKE` pattern matching `search` anywhere, with `%`, `_` and `\\` taken literally.
pub fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    Price,
    Name,
    Stock,
    Rating,
    Popularity,
    Newest,
    Updated,
}

impl ProductSort {
    /// Unrecognised keys fall back to newest-first.
    pub fn parse(value: Option<&str>) -> (Self, bool) {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("price") => (ProductSort::Price, true),
            Some("name") => (ProductSort::Name, true),
            Some("stock") => (ProductSort::Stock, true),
            Some("rating") => (ProductSort::Rating, true),
            Some("popularity") => (ProductSort::Popularity, true),
            Some("newest") => (ProductSort::Newest, true),
            Some("updated") => (ProductSort::Updated, true),
            _ => (ProductSort::Newest, false),
        }
    }

    pub fn default_order(&self) -> SortOrder {
        match self {
            ProductSort::Price | ProductSort::Name => SortOrder::Asc,
            ProductSort::Stock
            | ProductSort::Rating
            | ProductSort::Popularity
            | ProductSort::Newest
            | ProductSort::Updated => SortOrder::Desc,
        }
    }

    /// Resolve the `sort`/`order` pair. An explicit order only applies to a recognised key.
    pub fn resolve(sort: Option<&str>, order: Option<&str>) -> (Self, SortOrder) {
        let (key, recognised) = Self::parse(sort);
        let direction = match order.and_then(SortOrder::parse) {
            Some(direction) if recognised => direction,
            _ => key.default_order(),
        };
        (key, direction)
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Default, Clone)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Default, Clone)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Default, Clone)]
#[into_params(parameter_in = Query)]
pub struct CustomerQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 12, 0));
        assert_eq!(Pagination::new(3, 2).normalize(), (3, 2, 4));
        assert_eq!(Pagination::new(0, 1000).normalize(), (1, 100, 0));
        assert_eq!(Pagination::new(-4, 0).normalize(), (1, 1, 0));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("basil"), "%basil%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern(r"c:\d"), r"%c:\\d%");
    }

    #[test]
    fn huge_page_saturates_the_offset() {
        let query = ProductQuery {
            page: Some(i64::MAX),
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(query.pagination().normalize(), (i64::MAX, 2, i64::MAX));
    }

    #[test]
    fn sort_keys_map_to_fixed_directions() {
        let cases = [
            ("price", ProductSort::Price, SortOrder::Asc),
            ("name", ProductSort::Name, SortOrder::Asc),
            ("stock", ProductSort::Stock, SortOrder::Desc),
            ("rating", ProductSort::Rating, SortOrder::Desc),
            ("popularity", ProductSort::Popularity, SortOrder::Desc),
            ("newest", ProductSort::Newest, SortOrder::Desc),
            ("updated", ProductSort::Updated, SortOrder::Desc),
        ];
        for (key, sort, order) in cases {
            assert_eq!(ProductSort::resolve(Some(key), None), (sort, order), "{key}");
        }
    }

    #[test]
    fn explicit_order_overrides_recognised_key() {
        assert_eq!(
            ProductSort::resolve(Some("price"), Some("desc")),
            (ProductSort::Price, SortOrder::Desc)
        );
        assert_eq!(
            ProductSort::resolve(Some("PRICE"), Some("ASC")),
            (ProductSort::Price, SortOrder::Asc)
        );
    }

    #[test]
    fn unknown_sort_falls_back_to_newest_first() {
        assert_eq!(
            ProductSort::resolve(Some("cheapest"), Some("asc")),
            (ProductSort::Newest, SortOrder::Desc)
        );
        assert_eq!(
            ProductSort::resolve(None, None),
            (ProductSort::Newest, SortOrder::Desc)
        );
    }
}
