//! Domain types for the request engine

pub mod credential;
pub mod request;
pub mod response;
pub mod service;

pub use credential::{AuthScheme, Credential, GrantType};
pub use request::{HttpMethod, RequestDescriptor};
pub use response::RawResponse;
pub use service::{PageSizeBounds, PaginationDialect, PaginationProfile, Service};
