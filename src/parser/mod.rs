pub mod columns;
pub mod deserializers;
pub mod pipeline;
pub mod types;

pub use columns::resolve_field;
pub use deserializers::coerce_number;
pub use pipeline::{parse_csv_reader, parse_csv_text, ParseOutput};
pub use types::{ParseWarning, RawRow};
