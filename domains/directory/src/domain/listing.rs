//! User listing rules: filtering, sorting and page-number pagination

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use mailroom_common::{PageQuery, RoleName};

use crate::domain::entities::{DirectoryUser, UserListItem};

/// Sortable listing columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Email,
    Role,
    MaxEmails,
    CurrentEmailCount,
    #[default]
    CreatedAt,
}

impl SortKey {
    /// Parse a column name, falling back to `createdAt` for anything unknown
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("name") => SortKey::Name,
            Some("email") => SortKey::Email,
            Some("role") => SortKey::Role,
            Some("maxEmails") => SortKey::MaxEmails,
            Some("currentEmailCount") => SortKey::CurrentEmailCount,
            _ => SortKey::CreatedAt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Email => "email",
            SortKey::Role => "role",
            SortKey::MaxEmails => "maxEmails",
            SortKey::CurrentEmailCount => "currentEmailCount",
            SortKey::CreatedAt => "createdAt",
        }
    }

    fn compare(&self, a: &UserListItem, b: &UserListItem) -> Ordering {
        match self {
            SortKey::Name => text(&a.name).cmp(text(&b.name)),
            SortKey::Email => text(&a.email).cmp(text(&b.email)),
            SortKey::Role => a.role.as_str().cmp(b.role.as_str()),
            SortKey::MaxEmails => a.max_emails.cmp(&b.max_emails),
            SortKey::CurrentEmailCount => a.current_email_count.cmp(&b.current_email_count),
            SortKey::CreatedAt => created_millis(a).cmp(&created_millis(b)),
        }
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn created_millis(item: &UserListItem) -> i64 {
    item.created_at.map(|t| t.timestamp_millis()).unwrap_or(0)
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Anything other than `asc` sorts descending
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Which roles a listing keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFilter {
    Any,
    Only(RoleName),
    /// Named a role that does not exist; matches nobody
    Unmatched,
}

impl RoleFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => RoleFilter::Any,
            Some(name) => name
                .parse::<RoleName>()
                .map(RoleFilter::Only)
                .unwrap_or(RoleFilter::Unmatched),
        }
    }

    pub fn admits(&self, role: RoleName) -> bool {
        match self {
            RoleFilter::Any => true,
            RoleFilter::Only(wanted) => *wanted == role,
            RoleFilter::Unmatched => false,
        }
    }
}

/// Query parameters of the user listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub role_filter: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

impl ListUsersParams {
    pub fn page_query(&self) -> PageQuery {
        PageQuery::new(self.page, self.page_size)
    }

    /// Trimmed search text, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn role_filter(&self) -> RoleFilter {
        RoleFilter::parse(self.role_filter.as_deref())
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey::parse_or_default(self.sort_by.as_deref())
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::parse_or_default(self.sort_order.as_deref())
    }

    /// The effective parameters, echoed back to the caller
    pub fn applied(&self) -> AppliedFilters {
        AppliedFilters {
            search: self.search_term().unwrap_or("").to_string(),
            role_filter: self
                .role_filter
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .to_string(),
            sort_by: self.sort_key(),
            sort_order: self.sort_order(),
        }
    }
}

/// Filters and ordering that produced a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub search: String,
    pub role_filter: String,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

/// Page-number pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PaginationMeta {
    pub fn new(page: PageQuery, total_count: i64) -> Self {
        let page_size = page.page_size();
        let total_pages = (total_count + page_size - 1) / page_size;
        let current = page.page();
        Self {
            page: current,
            page_size,
            total_count,
            total_pages,
            has_next_page: current < total_pages,
            has_prev_page: current > 1,
        }
    }
}

/// One page of the user listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<UserListItem>,
    pub pagination: PaginationMeta,
    pub filters: AppliedFilters,
}

/// Keep users admitted by the role filter
pub fn filter_by_role(users: Vec<DirectoryUser>, filter: RoleFilter) -> Vec<DirectoryUser> {
    users.into_iter().filter(|u| filter.admits(u.role)).collect()
}

/// Stable sort; descending is the exact reverse of ascending.
pub fn sort_users(items: &mut [UserListItem], key: SortKey, order: SortOrder) {
    items.sort_by(|a, b| key.compare(a, b));
    if order == SortOrder::Desc {
        items.reverse();
    }
}

/// Slice one page out of the full, already sorted result
pub fn paginate(items: Vec<UserListItem>, page: PageQuery) -> (Vec<UserListItem>, PaginationMeta) {
    let meta = PaginationMeta::new(page, items.len() as i64);
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(page.page_size()).unwrap_or(usize::MAX);
    let slice = items.into_iter().skip(skip).take(take).collect();
    (slice, meta)
}
