use std::io::{self, Write};

use super::CpuContext;
use crate::memory::Word;
use crate::pcb::{self, ProcessState};
use crate::scheduler::IoWaitEntry;
use crate::Simulator;

impl<W: Write> Simulator<W> {
    /// Print suspends the process until `io_cycles` of simulated time
    /// have passed. The wait is absorbed by the global clock through the
    /// I/O-waiting queue; no CPU time is charged for it.
    pub(crate) fn instruction_print(
        &mut self,
        ctx: &mut CpuContext,
        io_cycles: Word,
    ) -> io::Result<()> {
        writeln!(self.out, "print")?;
        writeln!(
            self.out,
            "Process {} issued an IOInterrupt and moved to the IOWaitingQueue.",
            ctx.process_id
        )?;

        // Resume at the next instruction once the I/O completes.
        self.memory
            .write(ctx.base + pcb::STATE, ProcessState::IoWaiting.as_word());
        self.memory.write(
            ctx.base + pcb::PROGRAM_COUNTER,
            (ctx.program_counter + 1) as Word,
        );
        self.memory
            .write(ctx.base + pcb::CPU_CYCLES_USED, ctx.cpu_cycles_used);
        self.memory
            .write(ctx.base + pcb::REGISTER_VALUE, ctx.register_value);

        self.io_wait_queue.push_back(IoWaitEntry {
            base_address: ctx.base,
            entry_time: self.global_clock,
            io_cycles,
        });

        Ok(())
    }
}
