use crate::codon::{Codon, Nucleotide};
use crate::strand::Strand;

use super::LexerError;

/// Groups the significant characters of a source stream into codons.
///
/// Only A, C, G and T (either case) are significant; every other character is
/// a comment. The significant characters must divide into triplets.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    /** Human Readable positions in file */
    pub cur_line: usize,
    pub cur_col: usize,

    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(chars: &'a str) -> Lexer<'a> {
        Lexer {
            cur_col: 1,
            cur_line: 1,

            chars: chars.chars().peekable(),
        }
    }

    fn consume_char(&mut self) -> Option<char> {
        match self.chars.next() {
            Some(c) => {
                self.cur_col += 1;
                if c == '\n' {
                    self.cur_line += 1;
                    self.cur_col = 1;
                }
                Some(c)
            }
            None => None,
        }
    }

    /// The next full codon, or `None` once the source is exhausted.
    pub fn next_codon(&mut self) -> Result<Option<Codon>, LexerError> {
        let mut triplet = [Nucleotide::A; 3];
        let mut filled = 0;

        while let Some(c) = self.consume_char() {
            if let Some(nucleotide) = Nucleotide::from_char(c) {
                triplet[filled] = nucleotide;
                filled += 1;
                if filled == 3 {
                    return Ok(Some(Codon::new(triplet[0], triplet[1], triplet[2])));
                }
            }
            // anything that isn't a nucleotide is a comment
        }

        if filled == 0 {
            Ok(None)
        } else {
            Err(LexerError::TrailingNucleotides {
                count: filled,
                line: self.cur_line,
            })
        }
    }

    pub fn collect_strand(&mut self) -> Result<Strand, LexerError> {
        let mut codons = vec![];
        while let Some(codon) = self.next_codon()? {
            codons.push(codon);
        }
        Ok(Strand::new(codons))
    }
}
