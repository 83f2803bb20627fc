//! An educational operating-system simulator coupling a contiguous
//! first-fit memory allocator with round-robin CPU scheduling and I/O
//! waiting.
//!
//! A [`Workload`] describes the machine (memory size, quantum, context
//! switch cost) and a set of jobs, each carrying a small program over a
//! four-opcode instruction set. [`Simulator::run`] admits the jobs into
//! simulated memory, interleaves them on a single virtual CPU until every
//! process terminates, and writes a deterministic trace of admission,
//! dispatch, I/O, timeout, termination and memory-reclamation events to
//! its output sink.
//!
//! All simulated state (the memory arena, the free list, the three
//! scheduler queues and the global clock) is owned by the [`Simulator`]
//! value. Time never advances on its own; every tick is an explicit
//! charge against the global clock.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Write};

pub mod instruction;
pub mod memory;
pub mod pcb;
pub mod scheduler;
pub mod workload;

pub use instruction::Opcode;
pub use memory::{MainMemory, MemoryBlock, MemoryList, Word, EMPTY_WORD};
pub use pcb::ProcessState;
pub use scheduler::IoWaitEntry;
pub use workload::{Job, MachineConfig, ParseError, Workload};

/// The whole simulation: machine configuration, simulated memory, the
/// three scheduler queues and the clock, plus the sink the trace is
/// written to.
pub struct Simulator<W> {
    machine: MachineConfig,
    pub memory: MainMemory,
    pub memory_list: MemoryList,
    new_job_queue: VecDeque<Job>,
    ready_queue: VecDeque<usize>,
    io_wait_queue: VecDeque<IoWaitEntry>,
    global_clock: i64,
    total_cpu_time: i64,
    start_times: HashMap<Word, i64>,
    out: W,
}

impl<W: Write> Simulator<W> {
    pub fn new(workload: Workload, out: W) -> Self {
        let Workload { machine, jobs } = workload;

        Simulator {
            memory: MainMemory::new(machine.max_memory),
            memory_list: MemoryList::new(machine.max_memory),
            new_job_queue: jobs.into(),
            ready_queue: VecDeque::new(),
            io_wait_queue: VecDeque::new(),
            global_clock: 0,
            total_cpu_time: 0,
            start_times: HashMap::new(),
            machine,
            out,
        }
    }

    /// Runs the simulation to completion: one initial admission pass, the
    /// memory dump, then the dispatcher loop until every queue is empty.
    ///
    /// Every dispatcher pass charges the context-switch cost, whether it
    /// dispatches a process, only scans the I/O-waiting queue, or only
    /// retries admission. One final charge lands after the loop, before
    /// the total is printed.
    pub fn run(&mut self) -> io::Result<()> {
        self.admit_jobs()?;
        self.dump_memory()?;

        loop {
            if let Some(base) = self.ready_queue.pop_front() {
                self.global_clock += self.machine.switch_time;
                let process_id = self.memory.read(base + pcb::PROCESS_ID);
                writeln!(self.out, "Process {process_id} has moved to Running.")?;
                self.execute_quantum(base)?;
                self.check_io_waiting_queue()?;
            } else if !self.io_wait_queue.is_empty() {
                self.global_clock += self.machine.switch_time;
                self.check_io_waiting_queue()?;
            } else if !self.new_job_queue.is_empty() {
                self.global_clock += self.machine.switch_time;
                let admitted = self.admit_jobs()?;
                if admitted == 0 {
                    // Nothing is running or waiting on I/O, so memory can
                    // never change again; the remaining jobs are
                    // permanently blocked and retrying would spin forever.
                    break;
                }
            } else {
                break;
            }
        }

        self.global_clock += self.machine.switch_time;
        writeln!(self.out, "Total CPU time used: {}.", self.global_clock)
    }

    /// Prints every memory word as `<address> : <word>`.
    fn dump_memory(&mut self) -> io::Result<()> {
        for (address, word) in self.memory.words().iter().enumerate() {
            writeln!(self.out, "{address} : {word}")?;
        }
        Ok(())
    }

    pub fn machine(&self) -> &MachineConfig {
        &self.machine
    }

    /// Simulated time elapsed so far, in cycles.
    pub fn global_clock(&self) -> i64 {
        self.global_clock
    }

    /// Sum of `cpu_cycles_used` over all terminated processes.
    pub fn total_cpu_time(&self) -> i64 {
        self.total_cpu_time
    }

    /// Consumes the simulator, returning the trace sink.
    pub fn into_writer(self) -> W {
        self.out
    }
}
