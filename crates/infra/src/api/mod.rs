//! Request execution engine
//!
//! Control flow for one call:
//!
//! ```text
//! create_request -> RequestBuilder -> RequestDescriptor
//! execute -> cache lookup -> RetryController -> Transport
//!         -> normalize -> ApiResponse -> PageWalker (further pages)
//! ```

pub mod base_url;
pub mod builder;
pub mod executor;
pub mod normalizer;
pub mod pagination;
pub mod response;
pub mod retry;

pub use builder::RequestBuilder;
pub use executor::{Executor, ExecutorBuilder, SharedCache};
pub use normalizer::{normalize, Normalized};
pub use pagination::{PageLimits, PageWalker};
pub use response::ApiResponse;
pub use retry::{RetryController, RetryPolicy};
