//! Wavefront OBJ export

use std::io::{self, Write};

use super::Mesh;

/// Write the mesh as a Wavefront OBJ object named `name`
///
/// Faces keep their polygon loops; OBJ indices are 1-based.
pub fn write_obj<W: Write>(mesh: &Mesh, name: &str, mut out: W) -> io::Result<()> {
    writeln!(out, "o {}", name)?;
    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for face in &mesh.faces {
        write!(out, "f")?;
        for &v in face {
            write!(out, " {}", v + 1)?;
        }
        writeln!(out)?;
    }
    out.flush()
}
