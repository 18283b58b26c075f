use thiserror::Error;

pub mod lexer;

#[derive(Error, Debug)]
pub enum LexerError {
    #[error("IO Error: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("{count} stray nucleotide(s) left at line {line}; codons come in threes")]
    TrailingNucleotides { count: usize, line: usize },
}
