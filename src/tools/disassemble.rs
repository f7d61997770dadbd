use crate::DisassembleArgs;

use std::fs;
use std::io::Write;

use anyhow::Result;

use ld86_rs::decoder::build_decoder;
use ld86_rs::disasm::disassemble;

pub fn disassemble_file(args: &DisassembleArgs) -> Result<()> {
    let bytes = fs::read(&args.input)?;
    let origin = args.origin.unwrap_or(if args.raw { 0 } else { 0x100 });

    let decoder = build_decoder()?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    disassemble(&decoder, &bytes, origin, !args.no_hex, &mut out)?;
    out.flush()?;
    Ok(())
}
