//! HTTP route handlers for the paper translator service.
//!
//! Translation answers with PDF bytes, maintenance routes with JSON.

mod temp;
mod translate;

pub use temp::clear_temp_dir;
pub use translate::translate_pdf;
