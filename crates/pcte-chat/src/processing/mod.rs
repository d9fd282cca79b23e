pub mod chunker;
pub mod parser;

pub use chunker::{chunk_text, TextChunker};
pub use parser::load_document;
