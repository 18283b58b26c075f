use std::fmt;

use thiserror::Error;

use crate::codon::Codon;

/// A codon address that fell outside the strand.
///
/// The index is signed so that negative effective addresses (a signed offset
/// reaching left past position zero) can be reported as-is.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("codon index {index} is out of range (strand length {len})")]
pub struct AddressFault {
    pub index: isize,
    pub len: usize,
}

/// The mutable strand of codons that is simultaneously program and data.
///
/// Positions are 0-based and contiguous; all addressing is by codon index.
/// Every mutating operation shifts subsequent indices consistently, and the
/// range operations check bounds before touching anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strand {
    codons: Vec<Codon>,
}

impl Strand {
    pub fn new(codons: Vec<Codon>) -> Strand {
        Strand { codons }
    }

    pub fn len(&self) -> usize {
        self.codons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codons.is_empty()
    }

    pub fn as_slice(&self) -> &[Codon] {
        &self.codons
    }

    pub fn get(&self, index: usize) -> Result<Codon, AddressFault> {
        self.codons.get(index).copied().ok_or(self.fault(index))
    }

    pub fn set(&mut self, index: usize, codon: Codon) -> Result<(), AddressFault> {
        let fault = self.fault(index);
        match self.codons.get_mut(index) {
            Some(slot) => {
                *slot = codon;
                Ok(())
            }
            None => Err(fault),
        }
    }

    /// Insert before `index`; `index == len()` appends.
    pub fn insert(&mut self, index: usize, codon: Codon) -> Result<(), AddressFault> {
        if index > self.codons.len() {
            return Err(self.fault(index));
        }
        self.codons.insert(index, codon);
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<Codon, AddressFault> {
        if index >= self.codons.len() {
            return Err(self.fault(index));
        }
        Ok(self.codons.remove(index))
    }

    /// An owned copy of `len` codons starting at `start`.
    pub fn copy_range(&self, start: usize, len: usize) -> Result<Vec<Codon>, AddressFault> {
        if start + len > self.codons.len() {
            return Err(self.range_fault(start, len));
        }
        Ok(self.codons[start..start + len].to_vec())
    }

    pub fn delete_range(&mut self, start: usize, len: usize) -> Result<(), AddressFault> {
        if start + len > self.codons.len() {
            return Err(self.range_fault(start, len));
        }
        self.codons.drain(start..start + len);
        Ok(())
    }

    /// Insert `seq` before `at` in one move, preserving its order.
    pub fn splice(&mut self, at: usize, seq: &[Codon]) -> Result<(), AddressFault> {
        if at > self.codons.len() {
            return Err(self.fault(at));
        }
        self.codons.splice(at..at, seq.iter().copied());
        Ok(())
    }

    pub fn reverse_range(&mut self, start: usize, len: usize) -> Result<(), AddressFault> {
        if start + len > self.codons.len() {
            return Err(self.range_fault(start, len));
        }
        self.codons[start..start + len].reverse();
        Ok(())
    }

    fn fault(&self, index: usize) -> AddressFault {
        AddressFault {
            index: index as isize,
            len: self.codons.len(),
        }
    }

    fn range_fault(&self, start: usize, len: usize) -> AddressFault {
        // report the furthest index the range asked for
        let index = if len == 0 { start } else { start + len - 1 };
        self.fault(index)
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, codon) in self.codons.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{codon}")?;
        }
        Ok(())
    }
}
