//! Zscaler services and their pagination dialects

use std::fmt;

use serde::{Deserialize, Serialize};

/// The product API an endpoint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    /// Private Access
    Zpa,
    /// Internet Access
    Zia,
    /// Client Connector
    Zcc,
    /// Cloud & Branch Connector
    Ztw,
    /// Workflow Automation
    Zwa,
    /// Digital Experience
    Zdx,
    /// Anything without a recognised prefix
    Other,
}

impl Service {
    /// Classify a OneAPI endpoint by its first path segment
    ///
    /// `/zpa/mgmtconfig/v1/...` is ZPA, `/zia/api/v1/...` is ZIA and so on.
    /// Anything unrecognised is [`Service::Other`].
    pub fn from_endpoint(endpoint: &str) -> Self {
        let first = endpoint.trim_start_matches('/').split(['/', '?']).next().unwrap_or_default();
        match first.to_lowercase().as_str() {
            "zpa" => Self::Zpa,
            "zia" => Self::Zia,
            "zcc" => Self::Zcc,
            "ztw" => Self::Ztw,
            "zwa" => Self::Zwa,
            "zdx" => Self::Zdx,
            _ => Self::Other,
        }
    }

    /// Lowercase path prefix of the service
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zpa => "zpa",
            Self::Zia => "zia",
            Self::Zcc => "zcc",
            Self::Ztw => "ztw",
            Self::Zwa => "zwa",
            Self::Zdx => "zdx",
            Self::Other => "other",
        }
    }

    /// Only ZPA understands microtenant scoping
    pub const fn supports_microtenant(self) -> bool {
        matches!(self, Self::Zpa)
    }

    /// Pagination dialect, parameter names and page-size bounds
    pub const fn pagination(self) -> PaginationProfile {
        match self {
            Self::Zpa => PaginationProfile::page_number("page", "pagesize", PageSizeBounds::new(1, 20, 500)),
            Self::Zwa => PaginationProfile::page_number("page", "pageSize", PageSizeBounds::new(1, 20, 100)),
            Self::Zia | Self::Ztw => {
                PaginationProfile::bare_list("page", "pageSize", PageSizeBounds::new(1, 100, 1000))
            }
            Self::Zcc => PaginationProfile::bare_list("page", "pageSize", PageSizeBounds::new(1, 50, 5000)),
            Self::Zdx => PaginationProfile {
                dialect: PaginationDialect::Offset,
                page_param: "offset",
                size_param: "limit",
                bounds: PageSizeBounds::new(1, 10, 100),
            },
            Self::Other => {
                PaginationProfile::bare_list("page", "pageSize", PageSizeBounds::new(1, 100, 1000))
            }
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a service exposes further pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaginationDialect {
    /// `page` increments until `total_pages`
    PageNumber,
    /// `offset` follows the server supplied `next_offset`
    Offset,
    /// `page` increments until an empty page, or `total_pages` when the
    /// body happens to report it
    BareList,
}

/// Documented page-size range of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizeBounds {
    /// Smallest page size the service accepts
    pub min: u32,
    /// Page size used when none is requested
    pub default: u32,
    /// Largest page size the service accepts
    pub max: u32,
}

impl PageSizeBounds {
    /// Bounds with `min <= default <= max`
    pub const fn new(min: u32, default: u32, max: u32) -> Self {
        Self { min, default, max }
    }

    /// Clamp a requested page size into `[min, max]`
    pub fn clamp(&self, requested: i64) -> u32 {
        let clamped = requested.clamp(i64::from(self.min), i64::from(self.max));
        u32::try_from(clamped).unwrap_or(self.default)
    }
}

/// How one service paginates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationProfile {
    /// Rule for finding the next page
    pub dialect: PaginationDialect,
    /// Query parameter carrying the page number or offset
    pub page_param: &'static str,
    /// Query parameter carrying the page size
    pub size_param: &'static str,
    /// Page-size range requests are clamped to
    pub bounds: PageSizeBounds,
}

impl PaginationProfile {
    const fn page_number(page: &'static str, size: &'static str, bounds: PageSizeBounds) -> Self {
        Self { dialect: PaginationDialect::PageNumber, page_param: page, size_param: size, bounds }
    }

    const fn bare_list(page: &'static str, size: &'static str, bounds: PageSizeBounds) -> Self {
        Self { dialect: PaginationDialect::BareList, page_param: page, size_param: size, bounds }
    }
}
