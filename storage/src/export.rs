use std::io::{self, Write};

use isle_core::Mesh;

// Wavefront OBJ: one object with positions, normals, uvs and faces.
// OBJ indices are 1-based and every face reuses the same index for v/vt/vn.
pub fn write_obj<W: Write>(mesh: &Mesh, name: &str, mut writer: W) -> io::Result<()> {
    writeln!(writer, "o {name}")?;
    for v in &mesh.vertices {
        writeln!(writer, "v {} {} {}", v.position.x, v.position.y, v.position.z)?;
    }
    for v in &mesh.vertices {
        writeln!(writer, "vn {} {} {}", v.normal.x, v.normal.y, v.normal.z)?;
    }
    for v in &mesh.vertices {
        writeln!(writer, "vt {} {}", v.uv.x, v.uv.y)?;
    }
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] + 1, tri[1] + 1, tri[2] + 1];
        writeln!(writer, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
    }
    writer.flush()
}
