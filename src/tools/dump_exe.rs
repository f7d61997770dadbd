use crate::DumpExeArgs;

use std::fs;

use anyhow::Result;

use ld86_rs::exe::load_exe;

pub fn dump_exe(args: &DumpExeArgs) -> Result<()> {
    let bytes = fs::read(&args.input)?;
    let exe = load_exe(&bytes)?;

    print!("{}", exe.header.dump());

    if !exe.reloc_table.is_empty() {
        println!();
        println!("relocation table:");
        for item in &exe.reloc_table {
            println!("  {:04x}:{:04x}", item.segment, item.offset);
        }
    }

    println!();
    println!("image size: {:x}h = {}", exe.image.len(), exe.image.len());
    Ok(())
}
