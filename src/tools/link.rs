use crate::LinkArgs;

use std::fs;

use anyhow::{Context, Result};

use ld86_rs::linker::{link_modules, OutputFormat};
use ld86_rs::record::ObjectFile;

pub fn link(args: &LinkArgs) -> Result<()> {
    let format = OutputFormat::by_name(&args.format)?;

    let mut objects = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let name = path.display().to_string();
        let ofile = ObjectFile::load(path)?;
        objects.push((name, ofile));
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| format.default_output_name().into());
    let output_name = output.display().to_string();

    let result = link_modules(&objects, format, args.case_sensitive, &output_name)?;

    fs::write(&output, &result.bytes)
        .with_context(|| format!("writing output file {output_name}"))?;

    if let Some(map_path) = &args.map {
        fs::write(map_path, &result.map)
            .with_context(|| format!("writing map file {}", map_path.display()))?;
    }

    Ok(())
}
