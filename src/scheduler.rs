//! Admission, program loading and the I/O-waiting queue.
//!
//! The driver loop itself lives on [`Simulator::run`](crate::Simulator::run);
//! this module holds the scheduler operations it calls: admitting jobs
//! from the new-job queue into memory and completing elapsed I/O waits.

use std::collections::VecDeque;
use std::io::{self, Write};

use log::debug;

use crate::memory::Word;
use crate::pcb::{self, ProcessState};
use crate::workload::Job;
use crate::Simulator;

/// A process parked until `io_cycles` of simulated time have passed
/// since `entry_time`.
#[derive(Debug, Clone, Copy)]
pub struct IoWaitEntry {
    pub base_address: usize,
    pub entry_time: i64,
    pub io_cycles: i64,
}

impl<W: Write> Simulator<W> {
    /// Completes every I/O wait whose time has elapsed, moving its
    /// process back to the ready queue. Still-waiting entries keep their
    /// relative order.
    pub(crate) fn check_io_waiting_queue(&mut self) -> io::Result<()> {
        let mut still_waiting = VecDeque::with_capacity(self.io_wait_queue.len());

        while let Some(entry) = self.io_wait_queue.pop_front() {
            if self.global_clock - entry.entry_time >= entry.io_cycles {
                let base = entry.base_address;
                let process_id = self.memory.read(base + pcb::PROCESS_ID);

                debug_assert_eq!(
                    ProcessState::from_word(self.memory.read(base + pcb::STATE)),
                    Some(ProcessState::IoWaiting),
                );

                self.memory
                    .write(base + pcb::STATE, ProcessState::Ready.as_word());
                self.ready_queue.push_back(base);
                writeln!(
                    self.out,
                    "Process {process_id} completed I/O and is moved to the ReadyQueue."
                )?;
            } else {
                still_waiting.push_back(entry);
            }
        }

        self.io_wait_queue = still_waiting;
        Ok(())
    }

    /// Admits jobs from the front of the new-job queue until it drains or
    /// the head job cannot be placed. Admission is strictly FIFO: a
    /// blocked head is never skipped to try a smaller job behind it.
    ///
    /// Placement is first-fit; when it fails, adjacent free blocks are
    /// coalesced and the same job retried. Coalescing only ever runs
    /// here, after a failed placement.
    ///
    /// Returns how many jobs were admitted.
    pub(crate) fn admit_jobs(&mut self) -> io::Result<usize> {
        debug!("admission pass: {} job(s) queued", self.new_job_queue.len());
        self.memory_list.log_state();

        let mut admitted = 0;

        while let Some(job) = self.new_job_queue.pop_front() {
            let total_size = pcb::PCB_SIZE + job.max_memory_needed;

            match self.memory_list.allocate(job.process_id, total_size) {
                Some(base) => {
                    self.load_program(&job, base);
                    self.ready_queue.push_back(base);
                    admitted += 1;
                    writeln!(
                        self.out,
                        "Process {} loaded into memory at address {base} with size {total_size}.",
                        job.process_id
                    )?;
                }
                None => {
                    writeln!(
                        self.out,
                        "Insufficient memory for Process {}. Attempting memory coalescing.",
                        job.process_id
                    )?;

                    let coalesced = self.memory_list.coalesce();
                    if coalesced && self.memory_list.has_free_block_of(total_size) {
                        writeln!(
                            self.out,
                            "Memory coalesced. Process {} can now be loaded.",
                            job.process_id
                        )?;
                        self.new_job_queue.push_front(job);
                    } else {
                        writeln!(
                            self.out,
                            "Process {} waiting in NewJobQueue due to insufficient memory.",
                            job.process_id
                        )?;
                        self.new_job_queue.push_front(job);
                        break;
                    }
                }
            }
        }

        Ok(admitted)
    }

    /// Materializes a job in the block starting at `base`: the ten PCB
    /// header words, then the instruction region, then the data region
    /// with every instruction's operands packed contiguously in program
    /// order.
    fn load_program(&mut self, job: &Job, base: usize) {
        let instruction_base = base + pcb::PCB_SIZE;
        let data_base = instruction_base + job.instruction_size();

        self.memory.write(base + pcb::PROCESS_ID, job.process_id);
        self.memory
            .write(base + pcb::STATE, ProcessState::Ready.as_word());
        self.memory.write(base + pcb::PROGRAM_COUNTER, 0);
        self.memory
            .write(base + pcb::INSTRUCTION_BASE, instruction_base as Word);
        self.memory.write(base + pcb::DATA_BASE, data_base as Word);
        self.memory
            .write(base + pcb::MEMORY_LIMIT, job.max_memory_needed as Word);
        self.memory.write(base + pcb::CPU_CYCLES_USED, 0);
        self.memory.write(base + pcb::REGISTER_VALUE, 0);
        self.memory
            .write(base + pcb::MAX_MEMORY_NEEDED, job.max_memory_needed as Word);
        self.memory.write(base + pcb::MAIN_MEMORY_BASE, base as Word);

        for (index, opcode) in job.program.iter().enumerate() {
            self.memory.write(instruction_base + index, opcode.tag());
        }

        let mut address = data_base;
        for opcode in &job.program {
            for word in opcode.operand_words() {
                self.memory.write(address, word);
                address += 1;
            }
        }
    }
}
