pub mod error;
pub mod http;
pub mod open_enum;
pub mod record;
pub mod request;
pub mod union;

pub use error::{DataError, LlmError};
pub use open_enum::{KnownValue, OpenEnum};
pub use record::{FieldValue, RawRecord, Record, Validate};
pub use union::{DiscriminatedUnion, OpenUnion, OrderedTrial};
