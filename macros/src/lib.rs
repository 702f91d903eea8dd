//! Declaration macros for the anthropic-types crate.
//!
//! Every wire type in the crate is declared with one of three attributes:
//!
//! - [`record`](macro@record) - an object type backed by a `RawRecord`, with
//!   typed accessors generated per declared field
//! - [`api_enum`](macro@api_enum) - a closed set of wire strings, used through
//!   `OpenEnum` so unknown values survive
//! - [`union`](macro@union) - a tagged or ordered union over other wire types
//!
//! # Quick Start
//!
//! ```rust
//! use anthropic_types::{api_enum, record, union};
//! use anthropic_types::core::record::Record;
//! use anthropic_types::core::open_enum::OpenEnum;
//!
//! #[api_enum]
//! pub enum Mood {
//!     Calm,
//!     Excited,
//! }
//!
//! #[record(tag = "note")]
//! pub struct Note {
//!     pub body: String,
//!     pub mood: Option<OpenEnum<Mood>>,
//! }
//!
//! #[union(open)]
//! pub enum Item {
//!     #[variant(tag = "note")]
//!     Note(Note),
//!     #[variant(unknown)]
//!     Unknown(serde_json::Value),
//! }
//!
//! let item: Item = serde_json::from_str(r#"{"type":"note","body":"hi"}"#).unwrap();
//! assert_eq!(item.as_note().unwrap().body().unwrap(), "hi");
//! ```

use proc_macro::TokenStream;

mod api_enum;
mod record;
mod union;

/// Attribute macro declaring a record-backed wire type.
///
/// The struct's fields are not stored as Rust fields. The macro replaces them
/// with a single ordered `RawRecord` and generates one accessor pair per
/// declared field, so properties the declaration does not mention are kept
/// and written back unchanged.
///
/// # Field mapping
///
/// | Declaration | Getter | Fails when |
/// |-------------|--------|------------|
/// | `name: T` | `name() -> Result<T, DataError>` | key absent, `null`, wrong shape |
/// | `name: Option<T>` | `name() -> Result<Option<T>, DataError>` | wrong shape |
/// | `#[field(nullable)] name: Option<T>` | `name() -> Result<Option<T>, DataError>` | key absent, wrong shape |
///
/// Every field also gets `set_name(value)`. Optional fields get
/// `clear_name()`. `#[field(rename = "type")]` sets the wire key when it is
/// not the field name.
///
/// # Tagged records
///
/// `#[record(tag = "text")]` adds `pub const TYPE: &str`, a `kind()` getter
/// for the `type` property, a `Default` that writes the tag, and a shape check
/// that rejects a record whose `type` is anything else.
///
/// # Example
///
/// ```rust
/// use anthropic_types::record;
/// use anthropic_types::core::record::{Record, Validate};
/// use anthropic_types::core::error::DataError;
///
/// #[record(tag = "weather")]
/// pub struct Weather {
///     /// City name
///     pub city: String,
///     pub celsius: Option<f64>,
/// }
///
/// let mut weather = Weather::default();
/// assert!(matches!(weather.city(), Err(DataError::MissingRequiredField(_))));
///
/// weather.set_city("Lisbon").unwrap();
/// assert!(weather.validate().is_ok());
/// assert_eq!(weather.to_json(), r#"{"type":"weather","city":"Lisbon"}"#);
/// ```
#[proc_macro_attribute]
pub fn record(attr: TokenStream, item: TokenStream) -> TokenStream {
    match record::record_impl(attr.into(), item.into()) {
        Ok(output) => output.into(),
        Err(err) => err.write_errors().into(),
    }
}

/// Attribute macro declaring a closed set of wire strings.
///
/// Variants map to snake_case strings unless `#[wire(rename = "...")]` says
/// otherwise. The enum gets the usual value derives plus a `KnownValue`
/// implementation holding the two-way table, which is what `OpenEnum<E>`
/// consults.
///
/// ```rust
/// use anthropic_types::api_enum;
/// use anthropic_types::core::open_enum::{KnownValue, OpenEnum};
///
/// #[api_enum]
/// pub enum Tier {
///     Standard,
///     #[wire(rename = "priority_v2")]
///     Priority,
/// }
///
/// assert_eq!(Tier::Priority.as_str(), "priority_v2");
/// let tier = OpenEnum::<Tier>::from_wire("flex");
/// assert_eq!(tier.known(), None);
/// ```
#[proc_macro_attribute]
pub fn api_enum(attr: TokenStream, item: TokenStream) -> TokenStream {
    match api_enum::api_enum_impl(attr.into(), item.into()) {
        Ok(output) => output.into(),
        Err(err) => err.write_errors().into(),
    }
}

/// Attribute macro declaring a union over wire types.
///
/// Each variant wraps exactly one type. The policy is chosen once, in the
/// declaration:
///
/// - `#[union(closed)]` - dispatch on the discriminator, every failure is a
///   `NoMatchingVariant` error
/// - `#[union(open)]` - dispatch on the discriminator, failures land in the
///   variant marked `#[variant(unknown)]`, which must wrap `serde_json::Value`
/// - `#[union(ordered)]` - no discriminator; candidates are tried in
///   declaration order and the first that fits wins
///
/// Tagged variants carry `#[variant(tag = "...")]`. The discriminator field
/// defaults to `type` and can be changed with `discriminator = "..."`.
///
/// The generated enum serializes as whatever it wraps, and gets `From` impls
/// for each wrapped type that appears once, `as_*`/`is_*` accessors, a
/// `decode` constructor that reports structured errors, and `Validate`.
///
/// ```rust
/// use anthropic_types::union;
///
/// #[union(ordered)]
/// pub enum Prompt {
///     Text(String),
///     Lines(Vec<String>),
/// }
///
/// let prompt: Prompt = serde_json::from_str(r#""hello""#).unwrap();
/// assert!(prompt.is_text());
/// ```
#[proc_macro_attribute]
pub fn union(attr: TokenStream, item: TokenStream) -> TokenStream {
    match union::union_impl(attr.into(), item.into()) {
        Ok(output) => output.into(),
        Err(err) => err.write_errors().into(),
    }
}

/// Convert a PascalCase identifier to snake_case.
pub(crate) fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
