//! 网格的持久化存储: Wavefront OBJ, 二进制 STL (`stl_io`), 以及 (`serde` feature) bincode 快照.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;

use super::{triangle_normal, Mesh};

impl Mesh {
    /// 以 Wavefront OBJ 文本格式写出. 面片下标从 `1` 开始.
    pub fn write_obj<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(
            w,
            "# {} vertices, {} faces",
            self.vertices().len(),
            self.faces().len()
        )?;
        for [x, y, z] in self.vertices() {
            writeln!(w, "v {x} {y} {z}")?;
        }
        for [a, b, c] in self.faces() {
            writeln!(w, "f {} {} {}", a + 1, b + 1, c + 1)?;
        }
        w.flush()
    }

    /// 保存为 OBJ 文件.
    pub fn save_obj<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        self.write_obj(BufWriter::new(File::create(path.as_ref())?))?;
        info!("saved mesh to {}", path.as_ref().display());
        Ok(())
    }

    /// 以二进制 STL 格式写出. 坐标以 `f32` 保存, 法向已归一化, 退化面片的法向为零.
    pub fn write_stl<W: Write>(&self, mut w: W) -> io::Result<()> {
        let triangles: Vec<stl_io::Triangle> = self
            .triangles()
            .map(|[a, b, c]| {
                let n = triangle_normal(a, b, c);
                let len = n.iter().map(|v| v * v).sum::<f64>().sqrt();
                let n = if len > 0.0 { n.map(|v| v / len) } else { [0.0; 3] };
                stl_io::Triangle {
                    normal: stl_io::Normal::new(n.map(|v| v as f32)),
                    vertices: [a, b, c].map(|p| stl_io::Vertex::new(p.map(|v| v as f32))),
                }
            })
            .collect();
        stl_io::write_stl(&mut w, triangles.iter())?;
        w.flush()
    }

    /// 保存为二进制 STL 文件.
    pub fn save_stl<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        self.write_stl(BufWriter::new(File::create(path.as_ref())?))?;
        info!("saved mesh to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl Mesh {
    /// 以 bincode 格式保存网格快照.
    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> bincode::Result<()> {
        let w = BufWriter::new(File::create(path.as_ref())?);
        bincode::serialize_into(w, self)
    }

    /// 读取由 [`Mesh::save_bincode`] 保存的快照. 下标会被重新检查.
    pub fn load_bincode<P: AsRef<Path>>(path: P) -> bincode::Result<Mesh> {
        let r = io::BufReader::new(File::open(path.as_ref())?);
        let raw: Mesh = bincode::deserialize_from(r)?;
        let (vertices, faces) = raw.into_raw();
        Mesh::new(vertices, faces).map_err(|e| Box::new(bincode::ErrorKind::Custom(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::mesh::tests::{close, unit_cube};
    use crate::mesh::{Face, Mesh, Vec3};

    #[test]
    fn test_obj_text() {
        let mut buf = Vec::new();
        unit_cube().write_obj(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 8 + 12);
        assert_eq!(lines[1], "v 0 0 0");
        assert_eq!(lines[9], "f 1 3 2");
        assert_eq!(lines.iter().filter(|l| l.starts_with("f ")).count(), 12);
    }

    #[test]
    fn test_stl_layout() {
        let mut buf = Vec::new();
        unit_cube().write_stl(&mut buf).unwrap();
        assert_eq!(buf.len(), 80 + 4 + 12 * 50);
        assert_eq!(u32::from_le_bytes([buf[80], buf[81], buf[82], buf[83]]), 12);

        // 第一个面片的法向是 -z.
        let f = |at: usize| f32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        assert_eq!([f(84), f(88), f(92)], [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_stl_read_back() {
        let m = unit_cube().scaled([2.0, 1.0, 0.5]);
        let mut buf = Vec::new();
        m.write_stl(&mut buf).unwrap();

        let stl = stl_io::read_stl(&mut Cursor::new(buf)).unwrap();
        assert_eq!(stl.faces.len(), 12);
        assert_eq!(stl.vertices.len(), 8);
        let vertices: Vec<Vec3> = stl
            .vertices
            .iter()
            .map(|v| v.0.map(|x| x as f64))
            .collect();
        let faces: Vec<Face> = stl.faces.iter().map(|f| f.vertices).collect();
        let back = Mesh::new(vertices, faces).unwrap();
        assert!(back.is_closed());
        assert!(close(back.surface_area(), m.surface_area(), 1e-6));
        assert!(close(back.volume(), 1.0, 1e-6));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_bincode_snapshot() {
        let mut path = std::env::temp_dir();
        path.push(format!("cell-berry-mesh-{}.bin", std::process::id()));
        let m = unit_cube().scaled([0.5, 2.0, 1.0]);
        m.save_bincode(&path).unwrap();
        let back = Mesh::load_bincode(&path).unwrap();
        assert_eq!(back, m);
        std::fs::remove_file(path).unwrap();
    }
}
