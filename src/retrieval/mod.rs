//! Exemplar corpus and similarity retrieval

pub mod corpus;
pub mod generate;
pub mod index;

pub use corpus::{build_corpus, CorpusEntry};
pub use generate::SampleGenerator;
pub use index::{ExemplarIndex, IndexEntry, Retriever};
