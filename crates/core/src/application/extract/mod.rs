// Extraction Engine - typed values and table rows from raw text
//
// Synchronous and reentrant. Parsing and conversion failures are always
// recoverable: they are logged and the previous value is kept.

mod aggregate;
mod rows;
mod value;

pub use aggregate::aggregate;
pub use rows::{extract_rows, ParserConfig, PathSpec, Rows, FRAGMENT_GLUE, REGEX_KIND};
pub use value::{extract_value, find_all, refresh_from_text};
