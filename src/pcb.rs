//! Process control block layout.
//!
//! A PCB is not a heap object; it is the first ten words of the block a
//! process owns in main memory. The CPU and the scheduler read and write
//! its fields by address, using the offset constants below.

use crate::memory::Word;

/// Words occupied by the PCB header at the start of every owned block.
pub const PCB_SIZE: usize = 10;

pub const PROCESS_ID: usize = 0;
pub const STATE: usize = 1;
pub const PROGRAM_COUNTER: usize = 2;
pub const INSTRUCTION_BASE: usize = 3;
pub const DATA_BASE: usize = 4;
pub const MEMORY_LIMIT: usize = 5;
pub const CPU_CYCLES_USED: usize = 6;
pub const REGISTER_VALUE: usize = 7;
pub const MAX_MEMORY_NEEDED: usize = 8;
pub const MAIN_MEMORY_BASE: usize = 9;

/// Lifecycle state of a process, stored as a word in its PCB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New = 0,
    Ready = 1,
    Running = 2,
    Terminated = 3,
    IoWaiting = 4,
}

impl ProcessState {
    pub fn as_word(self) -> Word {
        self as Word
    }

    pub fn from_word(word: Word) -> Option<ProcessState> {
        match word {
            0 => Some(ProcessState::New),
            1 => Some(ProcessState::Ready),
            2 => Some(ProcessState::Running),
            3 => Some(ProcessState::Terminated),
            4 => Some(ProcessState::IoWaiting),
            _ => None,
        }
    }

    /// The label used in the termination report.
    pub fn label(self) -> &'static str {
        match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Terminated => "TERMINATED",
            ProcessState::IoWaiting => "IOWAITING",
        }
    }
}
