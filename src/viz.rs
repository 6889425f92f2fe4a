//! Optional PPM framebuffer sink: the external "visualization surface" of
//! §2/§6, reduced here to periodically dumping one `P6` frame to disk
//! instead of driving a live window. Disabled unless
//! [`crate::config::Config::viz_enabled`] is set.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::error::ReportError;
use crate::pond::Pond;

/// Fixed 16-entry palette keyed by a cell's first genome codon. Dead cells
/// render black regardless of genome content.
const PALETTE: [[u8; 3]; 16] = [
    [0x00, 0x00, 0x00],
    [0x1f, 0x77, 0xb4],
    [0xff, 0x7f, 0x0e],
    [0x2c, 0xa0, 0x2c],
    [0xd6, 0x27, 0x28],
    [0x94, 0x67, 0xbd],
    [0x8c, 0x56, 0x4b],
    [0xe3, 0x77, 0xc2],
    [0x7f, 0x7f, 0x7f],
    [0xbc, 0xbd, 0x22],
    [0x17, 0xbe, 0xcf],
    [0xff, 0xbb, 0x78],
    [0x98, 0xdf, 0x8a],
    [0xff, 0x9c, 0x96],
    [0xc4, 0x9c, 0x94],
    [0xf7, 0xb6, 0xd2],
];

/// Map one cell to its pixel color: black if dead, otherwise the palette
/// entry keyed by the first genome codon.
fn pixel_color(alive: bool, first_codon: u8) -> [u8; 3] {
    if !alive {
        [0, 0, 0]
    } else {
        PALETTE[(first_codon & 0xf) as usize]
    }
}

/// Write one binary PPM (`P6`) frame of the whole pond to `path`.
pub fn write_ppm_frame(pond: &Pond, path: &str) -> Result<(), ReportError> {
    let file = File::create(path).map_err(ReportError::Viz)?;
    let mut writer = BufWriter::new(file);
    write!(writer, "P6\n{} {}\n255\n", pond.width(), pond.height()).map_err(ReportError::Viz)?;
    for cell in pond.iter() {
        let color = pixel_color(cell.is_alive(), cell.genome.first_codon());
        writer.write_all(&color).map_err(ReportError::Viz)?;
    }
    writer.flush().map_err(ReportError::Viz)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_cell_is_black_regardless_of_genome() {
        assert_eq!(pixel_color(false, 0xf), [0, 0, 0]);
    }

    #[test]
    fn alive_cell_uses_palette_entry() {
        assert_eq!(pixel_color(true, 0x2), PALETTE[2]);
    }

    #[test]
    fn writes_header_and_one_pixel_per_cell() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("nanopond_test_{}.ppm", std::process::id()));
        let pond = Pond::new(2, 2, 16);
        write_ppm_frame(&pond, path.to_str().unwrap()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let header = b"P6\n2 2\n255\n";
        assert_eq!(&bytes[..header.len()], header);
        assert_eq!(bytes.len() - header.len(), 2 * 2 * 3);
        let _ = std::fs::remove_file(&path);
    }
}
