use std::fmt;

use crate::codon::{Codon, Nucleotide};

/// The Helix instruction set.
///
/// There are no branch or jump instructions; control flow is expressed by the
/// self-modification group rewriting the strand ahead of the instruction
/// pointer. Self-modification offsets are unsigned, LD/ST offsets and the
/// ADDI immediate are signed, and every offset is measured from the opcode
/// codon, not from the parameter that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// `ATG`: execution begins after the first of these; a no-op thereafter
    Start,
    /// `TGA`: halt successfully
    Stop,

    /// `CAG off new`: overwrite the codon at `off` with `new`
    Mut,
    /// `CTT off`: delete the codon at `off`
    Del,
    /// `CTA off new`: insert `new` before `off`
    Ins,
    /// `CCA off len`: duplicate the block at `off` in place
    Dup,
    /// `CCG src len dst`: cut the block at `src` and reinsert it at `dst`
    Trp,
    /// `CCC off len`: reverse the block at `off` in place
    Rev,

    /// `AAA c`: load the literal codon `c` into ACC
    Ldi,
    /// `AGT`: load the flag (as 0 or 1) into ACC
    Ldf,
    /// `AAG off`: load the codon at signed `off` into ACC
    Ld,
    /// `AAC off`: store ACC at signed `off`
    St,
    /// `AAT c`: add the signed value of `c` to ACC, wrapping modulo 64
    Addi,
    /// `ATA c`: set the flag if ACC equals `c`
    Cmp,
    /// `TAT c`: set the flag from the first nucleotide of `c` (A/C set, G/T clear)
    Setf,

    /// `GTA`: write ACC's character to the output port
    Out,
    /// `GAT`: read one value from the input port into ACC
    In,
}

impl OpCode {
    /// Look up the instruction a codon selects; `None` for every codon
    /// outside the table.
    pub fn decode(codon: Codon) -> Option<OpCode> {
        use Nucleotide::{A, C, G, T};

        match (codon.0, codon.1, codon.2) {
            (A, T, G) => Some(OpCode::Start),
            (T, G, A) => Some(OpCode::Stop),
            (C, A, G) => Some(OpCode::Mut),
            (C, T, T) => Some(OpCode::Del),
            (C, T, A) => Some(OpCode::Ins),
            (C, C, A) => Some(OpCode::Dup),
            (C, C, G) => Some(OpCode::Trp),
            (C, C, C) => Some(OpCode::Rev),
            (A, A, A) => Some(OpCode::Ldi),
            (A, G, T) => Some(OpCode::Ldf),
            (A, A, G) => Some(OpCode::Ld),
            (A, A, C) => Some(OpCode::St),
            (A, A, T) => Some(OpCode::Addi),
            (A, T, A) => Some(OpCode::Cmp),
            (T, A, T) => Some(OpCode::Setf),
            (G, T, A) => Some(OpCode::Out),
            (G, A, T) => Some(OpCode::In),
            _ => None,
        }
    }

    /// How many parameter codons follow the opcode.
    pub fn arity(self) -> usize {
        match self {
            OpCode::Start | OpCode::Stop | OpCode::Ldf | OpCode::Out | OpCode::In => 0,
            OpCode::Del
            | OpCode::Ldi
            | OpCode::Ld
            | OpCode::St
            | OpCode::Addi
            | OpCode::Cmp
            | OpCode::Setf => 1,
            OpCode::Mut | OpCode::Ins | OpCode::Dup | OpCode::Rev => 2,
            OpCode::Trp => 3,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Start => "START",
            OpCode::Stop => "STOP",
            OpCode::Mut => "MUT",
            OpCode::Del => "DEL",
            OpCode::Ins => "INS",
            OpCode::Dup => "DUP",
            OpCode::Trp => "TRP",
            OpCode::Rev => "REV",
            OpCode::Ldi => "LDI",
            OpCode::Ldf => "LDF",
            OpCode::Ld => "LD",
            OpCode::St => "ST",
            OpCode::Addi => "ADDI",
            OpCode::Cmp => "CMP",
            OpCode::Setf => "SETF",
            OpCode::Out => "OUT",
            OpCode::In => "IN",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
