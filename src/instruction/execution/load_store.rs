use std::io::{self, Write};

use super::CpuContext;
use crate::memory::Word;
use crate::Simulator;

// Store and Load address memory relative to the instruction base. An
// address outside the process's own region is reported and skipped; the
// errant instruction still costs its cycle and execution continues.

impl<W: Write> Simulator<W> {
    pub(crate) fn instruction_store(
        &mut self,
        ctx: &mut CpuContext,
        value: Word,
        address_offset: Word,
    ) -> io::Result<()> {
        ctx.register_value = value;

        let physical = ctx.instruction_base as i64 + address_offset;
        if self.in_process_region(ctx, physical) {
            self.memory.write(physical as usize, ctx.register_value);
            writeln!(self.out, "stored")?;
        } else {
            writeln!(self.out, "store error!")?;
        }

        self.charge(ctx, 1);
        Ok(())
    }

    pub(crate) fn instruction_load(
        &mut self,
        ctx: &mut CpuContext,
        address_offset: Word,
    ) -> io::Result<()> {
        let physical = ctx.instruction_base as i64 + address_offset;
        if self.in_process_region(ctx, physical) {
            ctx.register_value = self.memory.read(physical as usize);
            writeln!(self.out, "loaded")?;
        } else {
            writeln!(self.out, "load error!")?;
        }

        self.charge(ctx, 1);
        Ok(())
    }

    fn in_process_region(&self, ctx: &CpuContext, physical: i64) -> bool {
        let region_start = ctx.instruction_base as i64;
        physical >= region_start && physical < region_start + ctx.max_memory_needed
    }
}
