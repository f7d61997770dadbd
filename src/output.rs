//! Raw binary and COM image output.

use anyhow::{bail, ensure, Result};

use std::io::Write;

use crate::image::Image;

/// MS-DOS Programmer's Reference p. 82.
pub const MAX_COM_FILE_SIZE: u32 = 65024;

/// COM images load at this offset in their segment.
pub const COM_ORIGIN: u32 = 0x100;

/// Write a raw binary image: the bytes up to `hi`, verbatim.
pub fn write_bin<W: Write>(image: &Image, output: &mut W) -> Result<()> {
    ensure!(image.hi > image.lo, "no data for image");
    ensure!(image.lo == 0, "no data in image at offset 0h");

    if let Some(start) = image.start {
        ensure!(
            start.seg == 0 && start.offset == 0,
            "invalid start address for BIN file: {:04x}:{:04x}h",
            start.seg,
            start.offset
        );
    }

    ensure!(
        image.stack.is_none(),
        "cannot create BIN file: stack segment present"
    );

    output.write_all(&image.data[..image.hi as usize])?;
    Ok(())
}

/// Write a COM image: the bytes from 100h to `hi`, verbatim.
pub fn write_com<W: Write>(image: &Image, output: &mut W) -> Result<()> {
    ensure!(image.hi > image.lo, "no data for image");
    ensure!(image.lo >= COM_ORIGIN, "data in image segment before 100h");
    ensure!(image.lo == COM_ORIGIN, "no data in image at 100h");

    let Some(start) = image.start else {
        bail!("no start address for COM");
    };
    ensure!(
        start.seg == 0 && start.offset == 0x100,
        "invalid start address for COM file"
    );

    let size = image.hi - image.lo;
    ensure!(
        size <= MAX_COM_FILE_SIZE,
        "image too big for COM file: size {size}, max {MAX_COM_FILE_SIZE}"
    );

    ensure!(
        image.stack.is_none(),
        "cannot create COM file: stack segment present"
    );

    output.write_all(&image.data[COM_ORIGIN as usize..image.hi as usize])?;
    Ok(())
}
