//! Hybrid client/server pagination.
//!
//! Whether a feature's list endpoint paginates on the server is a static
//! flag, not something probed at runtime. For server-paginated features the
//! items handed in already are the requested page and only the page-count
//! arithmetic is derived here. Everything else is sliced client-side.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("items per page must be at least 1")]
    InvalidPageSize,
    #[error("page numbers start at 1")]
    InvalidPage,
}

/// Page metadata returned alongside a server-paginated response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerPageMeta {
    #[serde(default)]
    pub total_items: Option<usize>,
    #[serde(default)]
    pub total_pages: Option<usize>,
    #[serde(default)]
    pub current_page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

/// The visible page of a list plus its navigation metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// How a list should be paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub current_page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub fn new(current_page: usize, per_page: usize) -> Result<Self, PaginationError> {
        if per_page == 0 {
            return Err(PaginationError::InvalidPageSize);
        }
        if current_page == 0 {
            return Err(PaginationError::InvalidPage);
        }
        Ok(Self {
            current_page,
            per_page,
        })
    }
}

fn total_pages_for(total_items: usize, per_page: usize) -> usize {
    total_items.div_ceil(per_page)
}

/// Slice the full list client-side.
pub fn paginate_client<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    let PageRequest {
        current_page,
        per_page,
    } = request;
    let total_items = items.len();
    let total_pages = total_pages_for(total_items, per_page);

    let start = (current_page - 1).saturating_mul(per_page).min(total_items);
    let end = current_page.saturating_mul(per_page).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        current_page,
        per_page,
        total_items,
        total_pages,
        has_next_page: current_page < total_pages,
        has_previous_page: current_page > 1,
    }
}

/// Treat `items` as the page the server already selected.
///
/// Missing metadata falls back to what can be read off the page itself: with
/// no totals at all the page is assumed to be the only one.
pub fn paginate_server<T: Clone>(
    items: &[T],
    request: PageRequest,
    meta: Option<&ServerPageMeta>,
) -> Page<T> {
    let meta = meta.cloned().unwrap_or_default();
    let per_page = meta.per_page.filter(|p| *p > 0).unwrap_or(request.per_page);
    let current_page = meta.current_page.filter(|p| *p > 0).unwrap_or(request.current_page);

    let total_items = meta.total_items.unwrap_or_else(|| {
        // Without a server total only what has been seen so far is known.
        (current_page - 1)
            .saturating_mul(per_page)
            .saturating_add(items.len())
    });
    let total_pages = meta
        .total_pages
        .unwrap_or_else(|| total_pages_for(total_items, per_page));

    Page {
        items: items.to_vec(),
        current_page,
        per_page,
        total_items,
        total_pages,
        has_next_page: current_page < total_pages,
        has_previous_page: current_page > 1,
    }
}

/// Pick client or server paging based on the feature's static flag.
pub fn paginate<T: Clone>(
    items: &[T],
    current_page: usize,
    per_page: usize,
    server_paginated: bool,
    meta: Option<&ServerPageMeta>,
) -> Result<Page<T>, PaginationError> {
    let request = PageRequest::new(current_page, per_page)?;
    Ok(if server_paginated {
        paginate_server(items, request, meta)
    } else {
        paginate_client(items, request)
    })
}

/// Static per-feature table of which list endpoints paginate server-side.
#[derive(Debug, Clone)]
pub struct PaginationFlags {
    flags: HashMap<String, bool>,
}

impl Default for PaginationFlags {
    fn default() -> Self {
        let flags = [
            ("courses", true),
            ("payments", true),
            ("support_tickets", true),
            ("users", true),
            ("classes", false),
            ("schedule", false),
            ("attendance", false),
            ("grades", false),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self { flags }
    }
}

impl PaginationFlags {
    pub fn empty() -> Self {
        Self {
            flags: HashMap::new(),
        }
    }

    pub fn with(mut self, feature: impl Into<String>, server_paginated: bool) -> Self {
        self.flags.insert(feature.into(), server_paginated);
        self
    }

    /// Unknown features page client-side.
    pub fn is_server_paginated(&self, feature: &str) -> bool {
        self.flags.get(feature).copied().unwrap_or(false)
    }

    pub fn paginate<T: Clone>(
        &self,
        feature: &str,
        items: &[T],
        current_page: usize,
        per_page: usize,
        meta: Option<&ServerPageMeta>,
    ) -> Result<Page<T>, PaginationError> {
        paginate(
            items,
            current_page,
            per_page,
            self.is_server_paginated(feature),
            meta,
        )
    }
}
