//! Workload descriptions and the two input formats that produce them.
//!
//! A workload is the machine configuration plus the ordered list of jobs
//! to admit. The canonical format is a stream of whitespace-separated
//! integers; the same workload can also be given as JSON, which is what
//! fixture-driven tests use.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instruction::{Opcode, COMPUTE_TAG, LOAD_TAG, PRINT_TAG, STORE_TAG};
use crate::memory::Word;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEnd(&'static str),
    #[error("invalid integer {token:?} while reading {what}")]
    InvalidInteger { token: String, what: &'static str },
    #[error("unknown opcode tag {0}")]
    UnknownOpcode(Word),
    #[error("invalid workload JSON: {0}")]
    Json(#[from] sonic_rs::Error),
}

/// Machine parameters: memory size in words, the per-quantum cycle
/// budget, and the cost charged for every dispatcher pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub max_memory: usize,
    pub cpu_allocated: i64,
    pub switch_time: i64,
}

/// A job waiting for admission. Lives in the new-job queue until it is
/// placed in memory, at which point the descriptor is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub process_id: Word,
    /// Instruction region plus data region, in words. The block the job
    /// occupies is this plus the PCB header.
    pub max_memory_needed: usize,
    pub program: Vec<Opcode>,
}

impl Job {
    /// Words in the instruction region: one per instruction.
    pub fn instruction_size(&self) -> usize {
        self.program.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub machine: MachineConfig,
    pub jobs: Vec<Job>,
}

impl Workload {
    /// Parses the whitespace-separated integer format:
    ///
    /// ```text
    /// maxMemory CPUAllocated switchTime
    /// numProcesses
    /// <for each process:>
    ///   processID maxMemoryNeeded instructionSize
    ///   <instructionSize times:> opcode <operands>
    /// ```
    pub fn from_text(input: &str) -> Result<Workload, ParseError> {
        let mut tokens = Tokens::new(input);

        let machine = MachineConfig {
            max_memory: tokens.next_usize("max memory size")?,
            cpu_allocated: tokens.next_word("CPU quantum")?,
            switch_time: tokens.next_word("context switch time")?,
        };

        let process_count = tokens.next_usize("process count")?;
        let mut jobs = Vec::with_capacity(process_count);

        for _ in 0..process_count {
            let process_id = tokens.next_word("process ID")?;
            let max_memory_needed = tokens.next_usize("max memory needed")?;
            let instruction_count = tokens.next_usize("instruction count")?;

            let mut program = Vec::with_capacity(instruction_count);
            for _ in 0..instruction_count {
                program.push(parse_opcode(&mut tokens)?);
            }

            jobs.push(Job {
                process_id,
                max_memory_needed,
                program,
            });
        }

        Ok(Workload { machine, jobs })
    }

    /// Parses the JSON form of a workload.
    pub fn from_json(input: &str) -> Result<Workload, ParseError> {
        Ok(sonic_rs::from_str(input)?)
    }
}

fn parse_opcode(tokens: &mut Tokens<'_>) -> Result<Opcode, ParseError> {
    let tag = tokens.next_word("opcode")?;
    match tag {
        COMPUTE_TAG => Ok(Opcode::Compute {
            iterations: tokens.next_word("iterations")?,
            cycles: tokens.next_word("cycles")?,
        }),
        PRINT_TAG => Ok(Opcode::Print {
            io_cycles: tokens.next_word("I/O cycles")?,
        }),
        STORE_TAG => Ok(Opcode::Store {
            value: tokens.next_word("value")?,
            address_offset: tokens.next_word("address offset")?,
        }),
        LOAD_TAG => Ok(Opcode::Load {
            address_offset: tokens.next_word("address offset")?,
        }),
        other => Err(ParseError::UnknownOpcode(other)),
    }
}

struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            inner: input.split_whitespace(),
        }
    }

    fn next_word(&mut self, what: &'static str) -> Result<Word, ParseError> {
        let token = self.inner.next().ok_or(ParseError::UnexpectedEnd(what))?;
        token.parse().map_err(|_| ParseError::InvalidInteger {
            token: token.to_owned(),
            what,
        })
    }

    fn next_usize(&mut self, what: &'static str) -> Result<usize, ParseError> {
        let token = self.inner.next().ok_or(ParseError::UnexpectedEnd(what))?;
        token.parse().map_err(|_| ParseError::InvalidInteger {
            token: token.to_owned(),
            what,
        })
    }
}
