//! The virtual CPU.
//!
//! One call to [`Simulator::execute_quantum`] runs at most one quantum of
//! a single process and ends in one of three ways: the quantum expires
//! (timeout, back to the ready queue), the process issues I/O (into the
//! I/O-waiting queue), or the program is exhausted (termination, which
//! frees the process's memory and immediately re-runs admission).

use std::io::{self, Write};

use log::trace;

use super::Opcode;
use crate::memory::Word;
use crate::pcb::{self, ProcessState};
use crate::Simulator;

mod compute;
mod io_request;
mod load_store;

/// Working registers for one quantum. Loaded from the PCB on entry and
/// written back on every exit path.
pub(crate) struct CpuContext {
    pub base: usize,
    pub process_id: Word,
    /// Next instruction index, 0-based within the instruction region.
    pub program_counter: usize,
    pub instruction_base: usize,
    pub data_base: usize,
    pub instruction_size: usize,
    /// Data-region offset of the current instruction's operands.
    pub data_offset: usize,
    pub burst_cycles: i64,
    pub cpu_cycles_used: i64,
    pub register_value: Word,
    pub memory_limit: i64,
    pub max_memory_needed: i64,
}

impl<W: Write> Simulator<W> {
    /// Runs up to one quantum of the process whose PCB starts at `base`.
    pub(crate) fn execute_quantum(&mut self, base: usize) -> io::Result<()> {
        let process_id = self.memory.read(base + pcb::PROCESS_ID);
        let program_counter = self.memory.read(base + pcb::PROGRAM_COUNTER) as usize;
        let instruction_base = self.memory.read(base + pcb::INSTRUCTION_BASE) as usize;
        let data_base = self.memory.read(base + pcb::DATA_BASE) as usize;
        let memory_limit = self.memory.read(base + pcb::MEMORY_LIMIT);
        let cpu_cycles_used = self.memory.read(base + pcb::CPU_CYCLES_USED);
        let register_value = self.memory.read(base + pcb::REGISTER_VALUE);
        let max_memory_needed = self.memory.read(base + pcb::MAX_MEMORY_NEEDED);

        self.start_times
            .entry(process_id)
            .or_insert(self.global_clock);
        self.memory
            .write(base + pcb::STATE, ProcessState::Running.as_word());

        // The PCB does not store the data offset; reconstruct it from the
        // footprints of the instructions already executed. The program
        // counter may be mid-program after an earlier quantum.
        let mut data_offset = 0;
        for index in 0..program_counter {
            data_offset += super::data_footprint_of(self.memory.read(instruction_base + index));
        }

        let mut ctx = CpuContext {
            base,
            process_id,
            program_counter,
            instruction_base,
            data_base,
            instruction_size: data_base - instruction_base,
            data_offset,
            burst_cycles: 0,
            cpu_cycles_used,
            register_value,
            memory_limit,
            max_memory_needed,
        };

        trace!(
            "dispatch pid={} pc={} data_offset={} cycles_used={}",
            ctx.process_id,
            ctx.program_counter,
            ctx.data_offset,
            ctx.cpu_cycles_used
        );

        while ctx.program_counter < ctx.instruction_size
            && ctx.burst_cycles < self.machine.cpu_allocated
        {
            let opcode = self.fetch(&ctx);

            match opcode {
                Opcode::Compute { iterations, cycles } => {
                    self.instruction_compute(&mut ctx, iterations, cycles)?;
                }
                Opcode::Print { io_cycles } => {
                    // I/O suspends the process; the quantum ends here.
                    return self.instruction_print(&mut ctx, io_cycles);
                }
                Opcode::Store {
                    value,
                    address_offset,
                } => {
                    self.instruction_store(&mut ctx, value, address_offset)?;
                }
                Opcode::Load { address_offset } => {
                    self.instruction_load(&mut ctx, address_offset)?;
                }
            }

            ctx.program_counter += 1;
            ctx.data_offset += opcode.data_footprint();

            if ctx.burst_cycles >= self.machine.cpu_allocated
                && ctx.program_counter < ctx.instruction_size
            {
                return self.timeout(&ctx);
            }
        }

        self.terminate(ctx)
    }

    /// Fetches and decodes the instruction at the current program counter.
    fn fetch(&self, ctx: &CpuContext) -> Opcode {
        Opcode::from_memory(
            &self.memory,
            ctx.instruction_base + ctx.program_counter,
            ctx.data_base + ctx.data_offset,
        )
    }

    /// Charges `cycles` to the process and to simulated time.
    fn charge(&mut self, ctx: &mut CpuContext, cycles: i64) {
        ctx.cpu_cycles_used += cycles;
        ctx.burst_cycles += cycles;
        self.global_clock += cycles;
    }

    /// Quantum expired with instructions remaining: save state, requeue.
    fn timeout(&mut self, ctx: &CpuContext) -> io::Result<()> {
        self.memory
            .write(ctx.base + pcb::STATE, ProcessState::Ready.as_word());
        self.memory
            .write(ctx.base + pcb::PROGRAM_COUNTER, ctx.program_counter as Word);
        self.memory
            .write(ctx.base + pcb::CPU_CYCLES_USED, ctx.cpu_cycles_used);
        self.memory
            .write(ctx.base + pcb::REGISTER_VALUE, ctx.register_value);
        self.ready_queue.push_back(ctx.base);

        writeln!(
            self.out,
            "Process {} has a TimeOUT interrupt and is moved to the ReadyQueue.",
            ctx.process_id
        )
    }

    /// Program exhausted: write the terminal PCB, emit the report, free
    /// the process's memory and let a blocked job take its place.
    fn terminate(&mut self, ctx: CpuContext) -> io::Result<()> {
        // The terminal program counter is a sentinel one word before the
        // instruction region, preserved in the report.
        let sentinel = ctx.instruction_base as Word - 1;

        self.memory
            .write(ctx.base + pcb::STATE, ProcessState::Terminated.as_word());
        self.memory.write(ctx.base + pcb::PROGRAM_COUNTER, sentinel);
        self.memory
            .write(ctx.base + pcb::CPU_CYCLES_USED, ctx.cpu_cycles_used);
        self.memory
            .write(ctx.base + pcb::REGISTER_VALUE, ctx.register_value);

        let start_time = self.start_times[&ctx.process_id];
        let end_time = self.global_clock;
        self.total_cpu_time += ctx.cpu_cycles_used;

        writeln!(self.out, "Process ID: {}", ctx.process_id)?;
        writeln!(self.out, "State: {}", ProcessState::Terminated.label())?;
        writeln!(self.out, "Program Counter: {sentinel}")?;
        writeln!(self.out, "Instruction Base: {}", ctx.instruction_base)?;
        writeln!(self.out, "Data Base: {}", ctx.data_base)?;
        writeln!(self.out, "Memory Limit: {}", ctx.memory_limit)?;
        writeln!(self.out, "CPU Cycles Used: {}", ctx.cpu_cycles_used)?;
        writeln!(self.out, "Register Value: {}", ctx.register_value)?;
        writeln!(self.out, "Max Memory Needed: {}", ctx.max_memory_needed)?;
        writeln!(self.out, "Main Memory Base: {}", ctx.base)?;
        writeln!(
            self.out,
            "Total CPU Cycles Consumed: {}",
            end_time - start_time
        )?;
        writeln!(
            self.out,
            "Process {} terminated. Entered running state at: {}. Terminated at: {}. Total Execution Time: {}.",
            ctx.process_id,
            start_time,
            end_time,
            end_time - start_time
        )?;

        let (from, to) = self.memory_list.free(ctx.process_id, &mut self.memory);
        writeln!(
            self.out,
            "Process {} terminated and released memory from {from} to {to}.",
            ctx.process_id
        )?;

        // The freed block may unblock the head of the new-job queue.
        self.admit_jobs()?;
        Ok(())
    }
}
