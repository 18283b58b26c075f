use std::fmt;

use thiserror::Error;

pub mod charset;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("'{0}' is not a nucleotide (expected one of A, C, G, T)")]
pub struct ParseError(pub char);

/// One of the four bases a codon is built from.
///
/// The digit mapping A=0, C=1, G=2, T=3 makes a codon a three-digit base-4
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nucleotide {
    A,
    C,
    G,
    T,
}

impl Nucleotide {
    pub fn from_char(c: char) -> Option<Nucleotide> {
        match c.to_ascii_uppercase() {
            'A' => Some(Nucleotide::A),
            'C' => Some(Nucleotide::C),
            'G' => Some(Nucleotide::G),
            'T' => Some(Nucleotide::T),
            _ => None,
        }
    }

    pub fn digit(self) -> u8 {
        match self {
            Nucleotide::A => 0,
            Nucleotide::C => 1,
            Nucleotide::G => 2,
            Nucleotide::T => 3,
        }
    }

    pub fn from_digit(digit: u8) -> Nucleotide {
        match digit & 0b11 {
            0 => Nucleotide::A,
            1 => Nucleotide::C,
            2 => Nucleotide::G,
            _ => Nucleotide::T,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Nucleotide::A => 'A',
            Nucleotide::C => 'C',
            Nucleotide::G => 'G',
            Nucleotide::T => 'T',
        }
    }
}

/// A triplet of nucleotides, the unit of both code and data.
///
/// A codon carries an unsigned value in [0, 63] and a signed value in
/// [-32, 31] (two's complement over six bits). Codons are plain values;
/// they are copied, never aliased.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Codon(pub Nucleotide, pub Nucleotide, pub Nucleotide);

impl Codon {
    pub fn new(x: Nucleotide, y: Nucleotide, z: Nucleotide) -> Codon {
        Codon(x, y, z)
    }

    pub fn from_chars(x: char, y: char, z: char) -> Result<Codon, ParseError> {
        Ok(Codon(
            Nucleotide::from_char(x).ok_or(ParseError(x))?,
            Nucleotide::from_char(y).ok_or(ParseError(y))?,
            Nucleotide::from_char(z).ok_or(ParseError(z))?,
        ))
    }

    /// Build a codon from its unsigned value; only the low six bits count.
    pub fn from_unsigned(value: u8) -> Codon {
        let value = value & 0b11_1111;
        Codon(
            Nucleotide::from_digit(value >> 4),
            Nucleotide::from_digit((value >> 2) & 0b11),
            Nucleotide::from_digit(value & 0b11),
        )
    }

    pub fn from_signed(value: i8) -> Codon {
        Codon::from_unsigned(value.rem_euclid(64) as u8)
    }

    pub fn to_unsigned(self) -> u8 {
        16 * self.0.digit() + 4 * self.1.digit() + self.2.digit()
    }

    pub fn to_signed(self) -> i8 {
        let unsigned = self.to_unsigned() as i8;
        if unsigned < 32 {
            unsigned
        } else {
            unsigned - 64
        }
    }

    /// The printable character this codon's unsigned value maps to.
    pub fn to_char(self) -> Option<char> {
        charset::value_to_char(self.to_unsigned())
    }
}

impl Default for Codon {
    fn default() -> Codon {
        Codon(Nucleotide::A, Nucleotide::A, Nucleotide::A)
    }
}

impl fmt::Display for Codon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.0.to_char(), self.1.to_char(), self.2.to_char())
    }
}

impl fmt::Debug for Codon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
