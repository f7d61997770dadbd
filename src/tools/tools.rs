mod link;
use link::link;
mod disassemble;
use disassemble::disassemble_file;
mod dump_exe;
use dump_exe::dump_exe;
mod compare_exe;
use compare_exe::compare_exe_files;
mod dump_object;
use dump_object::dump_object;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// 16-bit x86 toolchain: linker, disassembler and EXE inspector
#[derive(Clone, Debug, Parser)]
struct Args {
    /// raise stderr verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    operation: Operation,
}

#[derive(Clone, Debug, Subcommand)]
enum Operation {
    /// Link object modules into a BIN, COM or EXE executable
    Link(LinkArgs),
    /// Disassemble a COM program or raw binary
    Disassemble(DisassembleArgs),
    /// Print an EXE file's header and relocation table
    DumpExe(DumpExeArgs),
    /// Compare two EXE files
    CompareExe(CompareExeArgs),
    /// Print the records of an object file
    DumpObject(DumpObjectArgs),
}

#[derive(Clone, Debug, Parser)]
struct LinkArgs {
    /// object files, linked in the given order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// output format: bin, com or exe
    #[arg(short, long, default_value = "com")]
    format: String,
    /// output file, defaults to A.<FORMAT>
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// treat symbol and segment names case-sensitively
    #[arg(long)]
    case_sensitive: bool,
    /// write a segment map to this file
    #[arg(short, long)]
    map: Option<PathBuf>,
}

#[derive(Clone, Debug, Parser)]
struct DisassembleArgs {
    input: PathBuf,
    /// load address of the first byte
    #[arg(short, long)]
    origin: Option<u32>,
    /// raw binary framing: origin 0 instead of the COM 100h
    #[arg(short, long)]
    raw: bool,
    /// omit the hex column, show assembly only
    #[arg(short, long)]
    no_hex: bool,
}

#[derive(Clone, Debug, Parser)]
struct DumpExeArgs {
    input: PathBuf,
}

#[derive(Clone, Debug, Parser)]
struct CompareExeArgs {
    first: PathBuf,
    second: PathBuf,
}

#[derive(Clone, Debug, Parser)]
struct DumpObjectArgs {
    input: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    stderrlog::new()
        .verbosity(args.verbose as usize)
        .init()?;

    match &args.operation {
        Operation::Link(link_args) => link(link_args),
        Operation::Disassemble(dis_args) => disassemble_file(dis_args),
        Operation::DumpExe(dump_args) => dump_exe(dump_args),
        Operation::CompareExe(cmp_args) => compare_exe_files(cmp_args),
        Operation::DumpObject(dump_args) => dump_object(dump_args),
    }
}
