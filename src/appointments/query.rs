//! Listing parameters: parsing of the raw query string into a validated
//! `ListQuery`, and the paginated response envelope.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw query string. Kept as strings so that non-numeric input is reported
/// as a validation error instead of falling back to a default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Description,
    #[default]
    CreationDate,
    UpdateDate,
    DueDate,
    CategoryId,
}

impl SortField {
    pub const ALLOWED: [&'static str; 5] =
        ["description", "creationDate", "updateDate", "dueDate", "categoryId"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "description" => Some(Self::Description),
            "creationDate" => Some(Self::CreationDate),
            "updateDate" => Some(Self::UpdateDate),
            "dueDate" => Some(Self::DueDate),
            "categoryId" => Some(Self::CategoryId),
            _ => None,
        }
    }

    /// Column name in the `appointments` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::CreationDate => "creation_date",
            Self::UpdateDate => "update_date",
            Self::DueDate => "due_date",
            Self::CategoryId => "category_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Which rows a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Owner(Uuid),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl ListQuery {
    /// Rows skipped before the current page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn take(&self) -> u64 {
        u64::from(self.limit)
    }
}

impl TryFrom<ListParams> for ListQuery {
    type Error = AppError;

    fn try_from(p: ListParams) -> Result<Self, Self::Error> {
        let page = match p.page.as_deref() {
            None => DEFAULT_PAGE,
            Some(raw) => parse_number("page", raw)?,
        };
        if page == 0 {
            return Err(AppError::validation("page must be 1 or greater"));
        }

        let limit = match p.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => parse_number("limit", raw)?,
        };
        if limit > MAX_LIMIT {
            return Err(AppError::validation(format!(
                "limit must not exceed {MAX_LIMIT}"
            )));
        }

        let sort_by = match p.sort_by.as_deref() {
            None => SortField::default(),
            Some(raw) => SortField::parse(raw).ok_or_else(|| {
                AppError::validation(format!(
                    "sortBy must be one of: {}",
                    SortField::ALLOWED.join(", ")
                ))
            })?,
        };

        let order = match p.order.as_deref() {
            None => SortOrder::default(),
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(_) => return Err(AppError::validation("order must be one of: asc, desc")),
        };

        Ok(Self {
            page,
            limit,
            sort_by,
            order,
        })
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| AppError::validation(format!("{name} must be a non-negative integer")))
}

/// Listing envelope: `total` counts every matching row, ignoring pagination.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, limit: Option<&str>, sort_by: Option<&str>, order: Option<&str>) -> ListParams {
        ListParams {
            page: page.map(Into::into),
            limit: limit.map(Into::into),
            sort_by: sort_by.map(Into::into),
            order: order.map(Into::into),
        }
    }

    #[test]
    fn defaults_when_nothing_given() {
        let q = ListQuery::try_from(ListParams::default()).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert_eq!(q.sort_by, SortField::CreationDate);
        assert_eq!(q.order, SortOrder::Asc);
        assert_eq!(q.skip(), 0);
    }

    #[test]
    fn skip_follows_page_and_limit() {
        let q = ListQuery::try_from(params(Some("3"), Some("7"), None, None)).unwrap();
        assert_eq!(q.skip(), 14);
        assert_eq!(q.take(), 7);
    }

    #[test]
    fn non_numeric_page_is_rejected() {
        let err = ListQuery::try_from(params(Some("two"), None, None, None)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = ListQuery::try_from(params(None, Some("-5"), None, None)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn page_zero_and_huge_limit_are_rejected() {
        assert!(ListQuery::try_from(params(Some("0"), None, None, None)).is_err());
        assert!(ListQuery::try_from(params(None, Some("101"), None, None)).is_err());
        assert!(ListQuery::try_from(params(None, Some("0"), None, None)).is_ok());
    }

    #[test]
    fn sort_by_uses_allow_list() {
        let err = ListQuery::try_from(params(None, None, Some("unknownField"), None)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        // column names are not accepted as aliases
        assert!(ListQuery::try_from(params(None, None, Some("creation_date"), None)).is_err());

        for raw in SortField::ALLOWED {
            let q = ListQuery::try_from(params(None, None, Some(raw), Some("desc"))).unwrap();
            assert_eq!(q.order, SortOrder::Desc);
        }
    }

    #[test]
    fn order_must_be_asc_or_desc() {
        assert!(ListQuery::try_from(params(None, None, None, Some("DESC"))).is_err());
        assert!(ListQuery::try_from(params(None, None, None, Some("random"))).is_err());
    }
}
