pub mod architecture;
pub mod bigram;
pub mod error;
pub mod tokenizer;

pub use architecture::ScoringModel;
pub use bigram::{BigramCache, BigramModel};
pub use error::{ModelError, Result};
pub use tokenizer::{BpeTokenizer, Tokenizer, END_OF_TEXT};
