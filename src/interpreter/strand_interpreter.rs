use crate::codon::{charset, Codon, Nucleotide};
use crate::opcode::OpCode;
use crate::strand::{AddressFault, Strand};

use super::{Halt, Runtime, RuntimeError};

/// Outcome of a single fetch/execute step.
enum Step {
    Continue,
    Stopped,
}

/// The fetch/execute loop over a mutable strand.
///
/// The instruction pointer is only ever written by the advance step here;
/// the self-modification instructions move the codons around it instead.
/// Offsets are measured from the opcode codon, and parameters are snapshotted
/// before an instruction's effect is applied, so an instruction that rewrites
/// its own parameters still sees the values it was fetched with.
pub struct StrandInterpreter {
    ip: usize,
    executed: u64,
    budget: Option<u64>,
}

impl StrandInterpreter {
    pub fn new() -> Self {
        Self::with_budget(None)
    }

    /// A budget of `n` aborts the run with `BudgetExhausted` before the
    /// `n + 1`th instruction.
    pub fn with_budget(budget: Option<u64>) -> Self {
        Self {
            ip: 0,
            executed: 0,
            budget,
        }
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Run the strand to termination.
    ///
    /// Execution begins after the first START codon; a strand without one
    /// halts immediately. Running off the end of the strand is a successful
    /// halt of its own kind, so the only `Err` outcomes are genuine faults.
    pub fn run(&mut self, runtime: &mut Runtime, strand: &mut Strand) -> Result<Halt, RuntimeError> {
        self.ip = match Self::find_start(strand) {
            Some(index) => index + 1,
            None => return Ok(Halt::NoProgram),
        };
        self.executed = 0;

        loop {
            if self.ip >= strand.len() {
                return Ok(Halt::OutOfBounds);
            }
            if let Some(limit) = self.budget {
                if self.executed >= limit {
                    return Err(RuntimeError::BudgetExhausted { ip: self.ip, limit });
                }
            }
            match self.step(runtime, strand)? {
                Step::Continue => self.executed += 1,
                Step::Stopped => return Ok(Halt::Stopped),
            }
        }
    }

    fn find_start(strand: &Strand) -> Option<usize> {
        strand
            .as_slice()
            .iter()
            .position(|&codon| OpCode::decode(codon) == Some(OpCode::Start))
    }

    fn step(&mut self, runtime: &mut Runtime, strand: &mut Strand) -> Result<Step, RuntimeError> {
        let ip = self.ip;
        let opcode = strand.as_slice()[ip];
        let op = OpCode::decode(opcode).ok_or(RuntimeError::UnknownOpcode {
            ip,
            opcode,
            len: strand.len(),
        })?;

        // Snapshot the parameters before any effect can touch them.
        let arity = op.arity();
        let mut params = [Codon::default(); 3];
        for j in 0..arity {
            match strand.get(ip + 1 + j) {
                Ok(codon) => params[j] = codon,
                Err(fault) => {
                    return Err(address(ip, op, &params[..j], strand.len(), fault));
                }
            }
        }

        // Where execution resumes on the pre-mutation layout; INS/DEL/DUP/TRP
        // correct it for every shift that lands inside [0, next_ip).
        let mut next_ip = ip + 1 + arity;

        match op {
            OpCode::Start => {}
            OpCode::Stop => return Ok(Step::Stopped),

            OpCode::Mut => {
                let target = ip + params[0].to_unsigned() as usize;
                strand
                    .set(target, params[1])
                    .map_err(|fault| address(ip, op, &params[..2], strand.len(), fault))?;
            }
            OpCode::Del => {
                let target = ip + params[0].to_unsigned() as usize;
                strand
                    .delete(target)
                    .map_err(|fault| address(ip, op, &params[..1], strand.len(), fault))?;
                if target < next_ip {
                    next_ip -= 1;
                }
            }
            OpCode::Ins => {
                let target = ip + params[0].to_unsigned() as usize;
                strand
                    .insert(target, params[1])
                    .map_err(|fault| address(ip, op, &params[..2], strand.len(), fault))?;
                if target <= next_ip {
                    next_ip += 1;
                }
            }
            OpCode::Dup => {
                let start = ip + params[0].to_unsigned() as usize;
                let count = params[1].to_unsigned() as usize;
                let block = strand
                    .copy_range(start, count)
                    .map_err(|fault| address(ip, op, &params[..2], strand.len(), fault))?;
                strand
                    .splice(start + count, &block)
                    .map_err(|fault| address(ip, op, &params[..2], strand.len(), fault))?;
                if start + count <= next_ip {
                    next_ip += count;
                }
            }
            OpCode::Trp => {
                let start = ip + params[0].to_unsigned() as usize;
                let count = params[1].to_unsigned() as usize;
                let dest = ip + params[2].to_unsigned() as usize;

                // Materialize the block and vet the landing site before
                // anything moves; a fault must leave the strand untouched.
                let block = strand
                    .copy_range(start, count)
                    .map_err(|fault| address(ip, op, &params[..3], strand.len(), fault))?;
                let landing = if dest <= start {
                    dest as isize
                } else {
                    dest as isize - count as isize
                };
                let remaining = strand.len() - count;
                if landing < 0 || landing as usize > remaining {
                    let fault = AddressFault {
                        index: landing,
                        len: remaining,
                    };
                    return Err(address(ip, op, &params[..3], strand.len(), fault));
                }
                let landing = landing as usize;
                strand
                    .delete_range(start, count)
                    .map_err(|fault| address(ip, op, &params[..3], strand.len(), fault))?;
                strand
                    .splice(landing, &block)
                    .map_err(|fault| address(ip, op, &params[..3], strand.len(), fault))?;

                // compound delete-then-insert, per-step rules in order
                if start < next_ip {
                    next_ip -= (start + count).min(next_ip) - start;
                }
                if landing <= next_ip {
                    next_ip += count;
                }
            }
            OpCode::Rev => {
                let start = ip + params[0].to_unsigned() as usize;
                let count = params[1].to_unsigned() as usize;
                strand
                    .reverse_range(start, count)
                    .map_err(|fault| address(ip, op, &params[..2], strand.len(), fault))?;
            }

            OpCode::Ldi => runtime.load_acc(params[0]),
            OpCode::Ldf => runtime.load_acc(Codon::from_unsigned(runtime.flag() as u8)),
            OpCode::Ld => {
                let codon = effective(ip, params[0].to_signed(), strand.len())
                    .and_then(|target| strand.get(target))
                    .map_err(|fault| address(ip, op, &params[..1], strand.len(), fault))?;
                runtime.load_acc(codon);
            }
            OpCode::St => {
                let target = effective(ip, params[0].to_signed(), strand.len())
                    .map_err(|fault| address(ip, op, &params[..1], strand.len(), fault))?;
                strand
                    .set(target, runtime.acc())
                    .map_err(|fault| address(ip, op, &params[..1], strand.len(), fault))?;
            }
            OpCode::Addi => runtime.acc_add_signed(params[0].to_signed()),
            OpCode::Cmp => runtime.set_flag(runtime.acc() == params[0]),
            OpCode::Setf => {
                runtime.set_flag(matches!(params[0].0, Nucleotide::A | Nucleotide::C));
            }

            OpCode::Out => {
                let acc = runtime.acc();
                let ch = acc.to_char().ok_or(RuntimeError::Domain {
                    ip,
                    value: acc.to_unsigned(),
                })?;
                runtime.write_char(ch)?;
            }
            OpCode::In => {
                let byte = runtime
                    .read_byte()?
                    .ok_or(RuntimeError::InputExhausted { ip })?;
                let value = charset::char_to_value(byte as char)
                    .ok_or(RuntimeError::InputOutOfRange { ip, byte })?;
                runtime.load_acc(Codon::from_unsigned(value));
            }
        }

        self.ip = next_ip;
        Ok(Step::Continue)
    }
}

/// The codon index a signed offset reaches from the opcode position.
fn effective(ip: usize, offset: i8, len: usize) -> Result<usize, AddressFault> {
    ip.checked_add_signed(offset as isize).ok_or(AddressFault {
        index: ip as isize + offset as isize,
        len,
    })
}

fn address(ip: usize, op: OpCode, params: &[Codon], len: usize, fault: AddressFault) -> RuntimeError {
    RuntimeError::Address {
        ip,
        op,
        params: params.to_vec(),
        len,
        fault,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use crate::lexer::lexer::Lexer;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn assemble(source: &str) -> Strand {
        Lexer::new(source).collect_strand().unwrap()
    }

    fn run_with_input(
        source: &str,
        input: &[u8],
    ) -> (Result<Halt, RuntimeError>, String, Strand) {
        let mut strand = assemble(source);
        let sink = SharedSink::default();
        let mut runtime = Runtime::new(
            Box::new(io::Cursor::new(input.to_vec())),
            Box::new(sink.clone()),
        );
        let mut interpreter = StrandInterpreter::new();
        let result = interpreter.run(&mut runtime, &mut strand);
        let output = String::from_utf8(sink.0.borrow().clone()).unwrap();
        (result, output, strand)
    }

    fn run(source: &str) -> (Result<Halt, RuntimeError>, String, Strand) {
        run_with_input(source, b"")
    }

    #[test]
    fn halt_immediately() {
        let (result, output, _) = run("ATG TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(output, "");
    }

    #[test]
    fn strand_without_start_is_no_program() {
        let (result, output, _) = run("AAA TGA GTA");
        assert_eq!(result.unwrap(), Halt::NoProgram);
        assert_eq!(output, "");
    }

    #[test]
    fn running_off_the_end_halts() {
        let (result, _, _) = run("ATG AAA AAA");
        assert_eq!(result.unwrap(), Halt::OutOfBounds);
    }

    #[test]
    fn print_a() {
        let (result, output, _) = run("ATG AAA AAA GTA TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(output, "A");
    }

    #[test]
    fn print_b_via_addi() {
        let (result, output, _) = run("ATG AAA AAA AAT AAC GTA TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(output, "B");
    }

    #[test]
    fn addi_wraps_modulo_64() {
        // ACC = 60, immediate +10, 70 mod 64 = 6 = 'G'
        let (result, output, _) = run("ATG AAA TTA AAT AGG GTA TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(output, "G");
    }

    #[test]
    fn mut_replaces_a_later_opcode_with_data() {
        // MUT writes ACA over the OUT opcode; the next fetch lands on it
        let (result, output, _) = run("ATG CAG AAT ACA GTA TGA");
        assert_eq!(output, "");
        match result.unwrap_err() {
            RuntimeError::UnknownOpcode { ip, opcode, .. } => {
                assert_eq!(ip, 4);
                assert_eq!(opcode.to_string(), "ACA");
            }
            other => panic!("expected UnknownOpcode, got {other}"),
        }
    }

    #[test]
    fn mut_replacing_with_a_real_opcode_executes_it() {
        let (result, output, strand) = run("ATG CAG AAT TGA GTA TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(output, "");
        assert_eq!(strand.to_string(), "ATG CAG AAT TGA TGA TGA");
    }

    #[test]
    fn mut_snapshot_survives_overwriting_own_parameter() {
        // offset 1 points MUT at its own first parameter; the write must land
        // where the originally fetched offset said, and execution resumes
        // past the untouched instruction region
        let (result, output, strand) = run("ATG CAG AAC TTT GTA TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(output, "A");
        assert_eq!(strand.to_string(), "ATG CAG TTT TTT GTA TGA");
    }

    #[test]
    fn del_of_the_executing_opcode_shifts_execution() {
        let (result, _, strand) = run("ATG CTT AAA TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(strand.to_string(), "ATG AAA TGA");
    }

    #[test]
    fn del_past_the_consumed_region_needs_no_adjustment() {
        let (result, _, strand) = run("ATG CTT AAG CCC TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(strand.to_string(), "ATG CTT AAG TGA");
    }

    #[test]
    fn ins_into_the_consumed_region_resumes_past_the_shift() {
        let (result, output, strand) = run("ATG AAA AAA CTA AAA TTT GTA TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(output, "A");
        assert_eq!(strand.to_string(), "ATG AAA AAA TTT CTA AAA TTT GTA TGA");
    }

    #[test]
    fn dup_appends_a_copy_of_a_later_block() {
        let (result, _, strand) = run("ATG CCA ACA AAG TGA ACC AGC");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(strand.to_string(), "ATG CCA ACA AAG TGA ACC AGC ACC AGC");
    }

    #[test]
    fn dup_of_the_consumed_region_resumes_past_the_copy() {
        let (result, _, strand) = run("ATG CCA AAA AAC TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(strand.to_string(), "ATG CCA CCA AAA AAC TGA");
    }

    #[test]
    fn trp_moves_a_block_backward() {
        let (result, _, strand) = run("ATG CCG ACC AAG ACA TGA ACC AGC");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(strand.to_string(), "ATG CCG ACC AAG ACA ACC AGC TGA");
    }

    #[test]
    fn trp_moves_a_block_forward() {
        let (result, _, strand) = run("ATG CCG ACA AAG ACT ACC AGC TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(strand.to_string(), "ATG CCG ACA AAG ACT TGA ACC AGC");
    }

    #[test]
    fn trp_length_is_preserved() {
        let before = assemble("ATG CCG ACC AAG ACA TGA ACC AGC");
        let (_, _, after) = run("ATG CCG ACC AAG ACA TGA ACC AGC");
        assert_eq!(after.len(), before.len());
    }

    #[test]
    fn trp_with_an_unreachable_destination_faults() {
        let (result, _, _) = run("ATG CCG ACA AAG TTT ACC AGC TGA");
        assert!(matches!(
            result.unwrap_err(),
            RuntimeError::Address { op: OpCode::Trp, .. }
        ));
    }

    #[test]
    fn rev_reverses_a_block_in_place() {
        let (result, _, strand) = run("ATG CCC ACA AAT TGA ACC AGC ATT");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(strand.to_string(), "ATG CCC ACA AAT TGA ATT AGC ACC");
    }

    #[test]
    fn rev_twice_restores_the_strand() {
        let source = "ATG CCC ACT AAT CCC ACA AAT TGA ACC AGC ATT";
        let before = assemble(source);
        let (result, _, after) = run(source);
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(after, before);
    }

    #[test]
    fn ld_with_a_negative_offset_reads_left() {
        // offset -1 loads the START codon (value 14, 'O')
        let (result, output, _) = run("ATG AAG TTT GTA TGA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(output, "O");
    }

    #[test]
    fn ld_reaching_before_the_strand_faults() {
        let (result, _, _) = run("ATG AAG TAA TGA");
        match result.unwrap_err() {
            RuntimeError::Address { op, fault, .. } => {
                assert_eq!(op, OpCode::Ld);
                assert_eq!(fault.index, -15);
            }
            other => panic!("expected Address, got {other}"),
        }
    }

    #[test]
    fn st_writes_acc_through_a_signed_offset() {
        let (result, _, strand) = run("ATG AAA ATT AAC AAT TGA AAA");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(strand.to_string(), "ATG AAA ATT AAC AAT TGA ATT");
    }

    #[test]
    fn cmp_sets_the_flag_on_equality() {
        let (_, output, _) = run("ATG AAA ACA ATA ACA AGT GTA TGA");
        assert_eq!(output, "B");
        let (_, output, _) = run("ATG AAA ACA ATA ACC AGT GTA TGA");
        assert_eq!(output, "A");
    }

    #[test]
    fn setf_reads_the_first_nucleotide() {
        let (_, output, _) = run("ATG TAT CAA AGT GTA TGA");
        assert_eq!(output, "B");
        let (_, output, _) = run("ATG TAT GAA AGT GTA TGA");
        assert_eq!(output, "A");
    }

    #[test]
    fn echo_one_char() {
        let (result, output, _) = run_with_input("ATG GAT GTA TGA", b"F");
        assert_eq!(result.unwrap(), Halt::Stopped);
        assert_eq!(output, "F");
    }

    #[test]
    fn reading_an_exhausted_port_faults() {
        let (result, _, _) = run("ATG GAT TGA");
        assert!(matches!(
            result.unwrap_err(),
            RuntimeError::InputExhausted { ip: 1 }
        ));
    }

    #[test]
    fn reading_an_unmapped_byte_faults() {
        let (result, _, _) = run_with_input("ATG GAT TGA", b"?");
        assert!(matches!(
            result.unwrap_err(),
            RuntimeError::InputOutOfRange { byte: b'?', .. }
        ));
    }

    #[test]
    fn unknown_opcode_faults() {
        let (result, _, _) = run("ATG ACA");
        assert!(matches!(
            result.unwrap_err(),
            RuntimeError::UnknownOpcode { ip: 1, .. }
        ));
    }

    #[test]
    fn missing_parameters_fault_with_the_partial_snapshot() {
        let (result, _, _) = run("ATG CAG AAA");
        match result.unwrap_err() {
            RuntimeError::Address { op, params, .. } => {
                assert_eq!(op, OpCode::Mut);
                assert_eq!(params.len(), 1);
            }
            other => panic!("expected Address, got {other}"),
        }
    }

    #[test]
    fn mut_out_of_range_faults() {
        let (result, _, _) = run("ATG CAG TAT AAA TGA");
        assert!(matches!(
            result.unwrap_err(),
            RuntimeError::Address { op: OpCode::Mut, .. }
        ));
    }

    #[test]
    fn budget_aborts_a_run() {
        let mut strand = assemble("ATG AAA AAA AAA AAA AAA AAA");
        let mut runtime = Runtime::new(Box::new(io::empty()), Box::new(io::sink()));
        let mut interpreter = StrandInterpreter::with_budget(Some(2));
        match interpreter.run(&mut runtime, &mut strand) {
            Err(RuntimeError::BudgetExhausted { ip: 5, limit: 2 }) => {}
            other => panic!("expected BudgetExhausted, got {other:?}"),
        }
        assert_eq!(interpreter.ip(), 5);
    }

    #[test]
    fn budget_large_enough_lets_the_run_finish() {
        let mut strand = assemble("ATG AAA AAA AAA AAA AAA AAA");
        let mut runtime = Runtime::new(Box::new(io::empty()), Box::new(io::sink()));
        let mut interpreter = StrandInterpreter::with_budget(Some(3));
        assert_eq!(
            interpreter.run(&mut runtime, &mut strand).unwrap(),
            Halt::OutOfBounds
        );
        assert_eq!(interpreter.executed(), 3);
    }

    #[test]
    fn strand_length_deltas_per_instruction() {
        // INS +1, DEL -1, DUP +n, REV 0
        let (_, _, strand) = run("ATG AAA AAA CTA AAA TTT GTA TGA");
        assert_eq!(strand.len(), 9);
        let (_, _, strand) = run("ATG CTT AAA TGA");
        assert_eq!(strand.len(), 3);
        let (_, _, strand) = run("ATG CCA ACA AAG TGA ACC AGC");
        assert_eq!(strand.len(), 9);
        let (_, _, strand) = run("ATG CCC ACA AAT TGA ACC AGC ATT");
        assert_eq!(strand.len(), 8);
    }
}
