//! Case document adapters

mod pdf_source;

pub use pdf_source::PdfDocumentSource;
