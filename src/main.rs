extern crate clap;
extern crate thiserror;

pub mod codon;
pub mod interpreter;
pub mod lexer;
pub mod opcode;
pub mod strand;

use std::{
    collections::HashSet,
    io::{self},
    time::Instant,
};

use clap::{Parser, ValueEnum};
use colored::Colorize;
use lexer::lexer::Lexer;

use crate::interpreter::{strand_interpreter::StrandInterpreter, Runtime};

/// Helix: an interpreter for the self-modifying codon-strand language
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The program file to run
    #[arg()]
    file: String,

    #[arg(value_enum)]
    commands: Vec<Commands>,

    /// Abort the run after this many instructions
    #[arg(short, long)]
    budget: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Hash, PartialEq, Eq)]
enum Commands {
    /// Print the lexed strand
    Codons,
    /// Execute the program (the default when no command is given)
    Run,
}

fn main() -> Result<(), ()> {
    let args = Args::parse();
    let commands: HashSet<Commands> = HashSet::from_iter(args.commands.into_iter());

    let text = match std::fs::read_to_string(&args.file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), lexer::LexerError::FileIO(e));
            return Err(());
        }
    };

    eprintln!("{} {}", "Lexing".blue(), args.file);
    let now = Instant::now();
    let mut strand = match Lexer::new(&text).collect_strand() {
        Ok(strand) => strand,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return Err(());
        }
    };
    eprintln!(
        "{} {} codons in {:.2?}",
        "Lexed".green(),
        strand.len(),
        now.elapsed()
    );

    if commands.contains(&Commands::Codons) {
        println!("{strand}");
    }

    if commands.is_empty() || commands.contains(&Commands::Run) {
        let stdin = io::stdin();
        let stdout = io::stdout();

        let mut runtime = Runtime::new(Box::new(stdin), Box::new(stdout));
        let mut interpreter = StrandInterpreter::with_budget(args.budget);

        eprintln!("{}", "Starting run".blue());
        let now = Instant::now();
        let result = interpreter.run(&mut runtime, &mut strand);
        if let Err(e) = runtime.flush() {
            eprintln!("{}: {}", "Error".red(), e);
            return Err(());
        }
        match result {
            Ok(halt) => eprintln!(
                "{} ({}) in {:.2?}",
                "Finished run".green(),
                halt,
                now.elapsed()
            ),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                return Err(());
            }
        }
    }

    Ok(())
}
