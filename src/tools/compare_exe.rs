use crate::CompareExeArgs;

use std::fs;

use anyhow::{Context, Result};

use ld86_rs::exe::{compare_exe, load_exe};

pub fn compare_exe_files(args: &CompareExeArgs) -> Result<()> {
    let first = fs::read(&args.first)?;
    let second = fs::read(&args.second)?;
    let first = load_exe(&first).with_context(|| args.first.display().to_string())?;
    let second = load_exe(&second).with_context(|| args.second.display().to_string())?;

    compare_exe(&first, &second).with_context(|| {
        format!(
            "{}, {}",
            args.first.display(),
            args.second.display()
        )
    })?;

    println!("EXE files match");
    Ok(())
}
