pub mod tokenizer;

pub use tokenizer::{TextTokenizer, Tokenizer};
