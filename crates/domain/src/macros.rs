//! Macro for implementing Display and FromStr for string-backed enums
//!
//! Cloud names, service identifiers and legacy product selectors all travel
//! through configuration files and environment variables as plain strings.
//! This macro gives each of those enums one canonical lowercase spelling and
//! case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use zscaler_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Product {
//!     Zia,
//!     Zpa,
//! }
//!
//! impl_domain_enum_conversions!(Product {
//!     Zia => "zia",
//!     Zpa => "zpa",
//! });
//!
//! assert_eq!(Product::Zia.to_string(), "zia");
//! assert_eq!("ZPA".parse::<Product>().unwrap(), Product::Zpa);
//! ```

/// Implements Display and FromStr traits for string-backed enums
///
/// This macro generates:
/// - Display trait: writes the canonical lowercase spelling
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// The string literals must be lowercase; parsing lowercases its input
/// before matching.
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
