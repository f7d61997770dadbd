use crate::DumpObjectArgs;

use anyhow::Result;

use ld86_rs::record::ObjectFile;

pub fn dump_object(args: &DumpObjectArgs) -> Result<()> {
    let ofile = ObjectFile::load(&args.input)?;
    for record in ofile.records() {
        println!("{}", record.dump_line());
    }
    Ok(())
}
