mod document;
mod render;
pub mod compose;
pub mod merge;

pub use document::PdfDocument;
pub use render::{PageImage, PageImages, PageRenderer, DEFAULT_DPI};
pub use compose::PageComposer;
pub use merge::{assemble, assemble_dir, combine_pdfs, ordered_page_files, MERGED_FILE_NAME};
