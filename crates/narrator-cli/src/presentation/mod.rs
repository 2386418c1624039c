//! Terminal output helpers shared by the handlers.

mod events;
mod tables;

pub use events::event_line;
pub use tables::{format_span, print_separator, truncate_chars};
