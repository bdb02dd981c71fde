use serde::{Deserialize, Serialize};

use super::error::{CatalogError, CatalogResult};

/// Page selection as received from the caller; zero or absent means "use the default"
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page_number: u64,
    #[serde(default)]
    pub page_size: u64,
}

/// Page selection after defaults and limits have been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u64,
    pub page_size: u64,
}

impl PageQuery {
    pub fn resolve(self, default_size: u64, max_size: u64) -> CatalogResult<PageRequest> {
        let page_number = if self.page_number == 0 { 1 } else { self.page_number };
        let page_size = if self.page_size == 0 { default_size } else { self.page_size };

        if page_size > max_size {
            return Err(CatalogError::validation(
                "page_size",
                format!("must be at most {}", max_size),
            ));
        }

        Ok(PageRequest {
            page_number,
            page_size,
        })
    }
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        (self.page_number - 1).saturating_mul(self.page_size)
    }
}

/// One page of records plus the totals for the whole filter
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub total: u64,
    pub page_number: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(page: PageRequest, total: u64, items: Vec<T>) -> Self {
        Self {
            total,
            page_number: page.page_number,
            page_size: page.page_size,
            total_pages: total.div_ceil(page.page_size.max(1)),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_zero_values() {
        let page = PageQuery::default().resolve(50, 100).unwrap();
        assert_eq!(page, PageRequest { page_number: 1, page_size: 50 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn oversized_pages_are_rejected() {
        let query = PageQuery { page_number: 1, page_size: 101 };
        assert!(matches!(
            query.resolve(10, 100),
            Err(CatalogError::Validation { ref field, .. }) if field == "page_size"
        ));
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageRequest { page_number: 2, page_size: 10 };
        let paginated = Paginated::new(page, 25, vec![(); 10]);
        assert_eq!(paginated.total_pages, 3);
        assert_eq!(page.offset(), 10);

        let empty: Paginated<()> = Paginated::new(page, 0, vec![]);
        assert_eq!(empty.total_pages, 0);
    }
}
