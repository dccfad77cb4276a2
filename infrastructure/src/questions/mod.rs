//! Question file adapters

mod markdown_file;

pub use markdown_file::MarkdownQuestionFile;
