//! The link pipeline: object modules in, executable bytes out.

use anyhow::{anyhow, bail, ensure, Result};
use log::debug;

use crate::combine::incorporate_module;
use crate::consolidate::consolidate_groups_and_stack;
use crate::exe::{build_exe, write_exe};
use crate::image::{build_image_with_bases, Image};
use crate::module::build_module;
use crate::output::{write_bin, write_com};
use crate::program::Program;
use crate::record::ObjectFile;
use crate::resolve::resolve_fixups;

/// Linker output executable formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Bin,
    Com,
    Exe,
}

impl OutputFormat {
    pub fn by_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bin" => Ok(OutputFormat::Bin),
            "com" => Ok(OutputFormat::Com),
            "exe" => Ok(OutputFormat::Exe),
            _ => Err(anyhow!("unknown output format: {name}")),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Bin => "BIN",
            OutputFormat::Com => "COM",
            OutputFormat::Exe => "EXE",
        }
    }

    pub fn default_output_name(self) -> &'static str {
        match self {
            OutputFormat::Bin => "A.BIN",
            OutputFormat::Com => "A.COM",
            OutputFormat::Exe => "A.EXE",
        }
    }
}

/// The produced executable plus a rendered segment map.
#[derive(Debug)]
pub struct LinkResult {
    pub bytes: Vec<u8>,
    pub map: String,
}

/// Link already-parsed object modules, in their given order, into an
/// executable of the requested format.
pub fn link_modules(
    objects: &[(String, ObjectFile)],
    format: OutputFormat,
    case_sensitive: bool,
    output_name: &str,
) -> Result<LinkResult> {
    ensure!(!objects.is_empty(), "no object file specified");

    let mut prog = Program::new(output_name, case_sensitive);

    for (name, ofile) in objects {
        debug!("load object module: {name}");
        let module = build_module(ofile, case_sensitive, name)?;
        incorporate_module(&mut prog, module)?;
    }

    consolidate_groups_and_stack(&mut prog)?;
    resolve_fixups(&mut prog)?;

    let (image, bases) = build_image_with_bases(&mut prog)?;
    let map = render_map(&prog, &image, &bases);

    debug!("output {} file: {output_name}", format.name());
    let mut bytes = Vec::new();
    match format {
        OutputFormat::Bin => {
            check_no_load_time_fixups(&prog, format)?;
            write_bin(&image, &mut bytes)?;
        }
        OutputFormat::Com => {
            check_no_load_time_fixups(&prog, format)?;
            write_com(&image, &mut bytes)?;
        }
        OutputFormat::Exe => {
            let exe = build_exe(&prog, image)?;
            write_exe(&exe, &mut bytes)?;
        }
    }

    Ok(LinkResult { bytes, map })
}

/// A raw binary or COM file cannot carry segment address fixups to be
/// performed at load time.
fn check_no_load_time_fixups(prog: &Program, format: OutputFormat) -> Result<()> {
    let n = prog.fixups.load_time_count();
    if n > 0 {
        bail!("cannot produce {} file: segment fixups: {n}", format.name());
    }
    Ok(())
}

/// One line per live segment, plus the start and stack placements.
fn render_map(prog: &Program, image: &Image, bases: &[u32]) -> String {
    let mut map = String::new();
    map.push_str("segment  base   size  name\n");
    for (segno, seg) in prog.segs.iter() {
        map.push_str(&format!(
            "{segno:>7}  {:05x}  {:04x}  {}\n",
            bases[segno],
            seg.end(),
            seg.name
        ));
    }
    if let Some(start) = image.start {
        map.push_str(&format!("start {:04x}:{:04x}\n", start.seg, start.offset));
    }
    if let Some(stack) = image.stack {
        map.push_str(&format!(
            "stack {:04x} size {:04x}\n",
            stack.seg, stack.size
        ));
    }
    if image.space > 0 {
        map.push_str(&format!("trailing space {:05x}\n", image.space));
    }
    map
}
