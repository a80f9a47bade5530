//! 测量结果.

use cell_berry::pipeline::{CellSurface, PipelineError};
use cell_berry::LabelId;
use std::io::{self, Write};

/// 将单个细胞的测量结果写进 `w` 中.
fn describe_into<W: Write>(cell: &CellSurface, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    let mesh = cell.mesh();
    writeln!(w, "Cell `{}`:", cell.label())?;
    writeln!(w, "{S4}Voxels: {}", cell.region().count())?;
    writeln!(w, "{S4}Mesh: {} vertices, {} faces", mesh.vertices().len(), mesh.faces().len())?;
    writeln!(w, "{S4}Closed: {}", mesh.is_closed())?;
    writeln!(w, "{S4}Scale: {:?} ({:?})", cell.scale(), cell.order())?;
    writeln!(w, "{S4}Surface area: {:.6} (unit = {})", cell.area(), cell.unit())?;
    writeln!(w, "{S4}Physical surface area: {:.6}", cell.physical_area())?;
    write!(w, "{S4}Physical volume: {:.6}", cell.physical_volume())?;
    Ok(())
}

/// 测量最终结果.
pub struct SurfaceReport {
    data: Vec<Result<CellSurface, PipelineError>>,
}

impl SurfaceReport {
    pub fn from_iter<I: IntoIterator<Item = Result<CellSurface, PipelineError>>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 成功测量的细胞.
    pub fn cells(&self) -> impl Iterator<Item = &CellSurface> {
        self.data.iter().filter_map(|r| r.as_ref().ok())
    }

    /// 成功测量的细胞中, 表面积最大者的标签.
    pub fn largest(&self) -> Option<LabelId> {
        self.cells()
            .max_by(|a, b| a.area().total_cmp(&b.area()))
            .map(CellSurface::label)
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for r in self.data.iter() {
            match r {
                Ok(cell) => {
                    describe_into(cell, &mut buf).unwrap();
                    println!("{}", String::from_utf8_lossy(&buf));
                    buf.clear();
                }
                Err(e) => println!("Failed: {e}"),
            }
            utils::sep();
        }

        let failed = self.data.iter().filter(|r| r.is_err()).count();
        println!("{} cell(s) measured, {failed} failed", self.data.len() - failed);
        if let Some(l) = self.largest() {
            println!("Largest surface: cell `{l}`");
        }
    }
}
