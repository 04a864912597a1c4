pub mod json_store;
pub mod pdf;

pub use json_store::JsonFileRepository;
pub use pdf::PdfExtractAdapter;
