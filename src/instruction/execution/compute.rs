use std::io::{self, Write};

use super::CpuContext;
use crate::memory::Word;
use crate::Simulator;

impl<W: Write> Simulator<W> {
    pub(crate) fn instruction_compute(
        &mut self,
        ctx: &mut CpuContext,
        _iterations: Word,
        cycles: Word,
    ) -> io::Result<()> {
        writeln!(self.out, "compute")?;
        self.charge(ctx, cycles);
        Ok(())
    }
}
