//! 细胞表面积测量流程.
//!
//! 1. 按标签选择区域;
//! 2. 提取补边后的二值掩膜, 并 (可选地) 重排为 `(row, col, plane)`;
//! 3. 在掩膜标量场上提取等值面;
//! 4. 以参考轴归一化的体素间距缩放网格, 并求三角形面积之和.
//!
//! 归一化后的网格以参考轴的物理间距为长度单位, 因此表面积乘以参考轴间距的平方
//! 即为物理面积.

use std::fmt;
use std::path::Path;

use log::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::{BACKGROUND, DEFAULT_ISO_LEVEL, DEFAULT_MASK_PADDING};
use crate::mesh::{IsoSurface, Mesh};
use crate::region::Region;
use crate::{Axis3, LabelId, LabelVolume, LoadError, Spacing, VolumeAttr};

/// 创建 [`SurfaceSpec`] 错误.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitSpecError {
    /// 等值必须位于掩膜背景值 `0` 与前景值 `1` 之间 (不含两端).
    LevelOutOfRange(f32),
}

impl fmt::Display for InitSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitSpecError::LevelOutOfRange(v) => {
                write!(f, "iso level `{v}` is not strictly between 0 and 1")
            }
        }
    }
}

impl std::error::Error for InitSpecError {}

/// 表面积测量配置.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawSurfaceSpec")
)]
pub struct SurfaceSpec {
    level: f32,
    pad: usize,
    reference: Axis3,
    reorder: bool,
}

/// 反序列化得到的未检查配置, 经 [`SurfaceSpec::new`] 检查后使用.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSurfaceSpec {
    level: f32,
    pad: usize,
    reference: Axis3,
    reorder: bool,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSurfaceSpec> for SurfaceSpec {
    type Error = InitSpecError;

    fn try_from(raw: RawSurfaceSpec) -> Result<Self, Self::Error> {
        SurfaceSpec::new(raw.level, raw.pad, raw.reference, raw.reorder)
    }
}

impl Default for SurfaceSpec {
    /// 等值 `0.5`, 补边 `1` 层, 以切片方向 (plane) 为参考轴, 重排为 `(row, col, plane)`.
    fn default() -> Self {
        Self {
            level: DEFAULT_ISO_LEVEL,
            pad: DEFAULT_MASK_PADDING,
            reference: Axis3::Plane,
            reorder: true,
        }
    }
}

impl SurfaceSpec {
    /// 创建配置.
    ///
    /// `level` 必须严格位于 `(0, 1)`, 否则返回错误. `pad` 为 `0` 时,
    /// 触及包围盒边界的区域得到的网格不封闭.
    pub fn new(level: f32, pad: usize, reference: Axis3, reorder: bool) -> Result<Self, InitSpecError> {
        if !(level > 0.0 && level < 1.0) {
            return Err(InitSpecError::LevelOutOfRange(level));
        }
        Ok(Self {
            level,
            pad,
            reference,
            reorder,
        })
    }

    /// 等值.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 掩膜补边层数.
    #[inline]
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// 间距归一化的参考轴.
    #[inline]
    pub fn reference(&self) -> Axis3 {
        self.reference
    }

    /// 是否重排为 `(row, col, plane)`.
    #[inline]
    pub fn reorder(&self) -> bool {
        self.reorder
    }
}

/// 测量流程错误.
#[derive(Debug)]
pub enum PipelineError {
    /// 体数据读取错误.
    Load(LoadError),

    /// 体数据中不存在该标签 (或该标签是背景).
    MissingLabel(LabelId),

    /// 区域掩膜没有产生任何面片 (例如 `pad` 为 `0` 且区域填满包围盒).
    EmptySurface(LabelId),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Load(e) => write!(f, "cannot load volume: {e}"),
            PipelineError::MissingLabel(l) => write!(f, "label `{l}` is not present in the volume"),
            PipelineError::EmptySurface(l) => write!(f, "label `{l}` produced an empty surface"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Load(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for PipelineError {
    #[inline]
    fn from(e: LoadError) -> Self {
        PipelineError::Load(e)
    }
}

/// 单个细胞的测量结果.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellSurface {
    region: Region,
    mesh: Mesh,
    order: [Axis3; 3],
    scale: [f64; 3],
    area: f64,
    unit: f64,
}

impl CellSurface {
    /// 区域标签.
    #[inline]
    pub fn label(&self) -> LabelId {
        self.region.label()
    }

    /// 区域描述.
    #[inline]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// 已按归一化间距缩放的网格. 坐标轴顺序见 [`Self::order`],
    /// 原点与来源体数据的格点 `(0, 0, 0)` 重合.
    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// 网格坐标的轴顺序.
    #[inline]
    pub fn order(&self) -> [Axis3; 3] {
        self.order
    }

    /// 作用于网格的归一化间距, 按网格坐标轴顺序排列.
    #[inline]
    pub fn scale(&self) -> [f64; 3] {
        self.scale
    }

    /// 以参考轴间距为长度单位的表面积.
    #[inline]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// 参考轴的物理间距, 即网格坐标的长度单位.
    #[inline]
    pub fn unit(&self) -> f64 {
        self.unit
    }

    /// 物理表面积.
    #[inline]
    pub fn physical_area(&self) -> f64 {
        self.area * self.unit * self.unit
    }

    /// 网格围成的物理体积.
    #[inline]
    pub fn physical_volume(&self) -> f64 {
        self.mesh.volume() * self.unit.powi(3)
    }
}

/// 对已知区域执行测量.
fn measure(volume: &LabelVolume, region: Region, spec: &SurfaceSpec) -> Result<CellSurface, PipelineError> {
    let label = region.label();
    let mask = volume.region_mask(&region, spec.pad());
    let mask = if spec.reorder() {
        mask.to_row_col_plane()
    } else {
        mask
    };
    debug!(
        "label {label}: {} voxel(s), mask {:?} in {:?} order",
        region.count(),
        mask.shape(),
        mask.order()
    );

    let order = mask.order();
    let normalized = volume.spacing().normalized(spec.reference());
    let scale = order.map(|a| normalized[a.index()]);
    let origin = mask.origin().map(|v| v as f64);

    let mesh = IsoSurface::new(spec.level(), [1.0; 3])
        .with_origin(origin)
        .extract(mask.to_field().view());
    if mesh.is_empty() {
        return Err(PipelineError::EmptySurface(label));
    }
    let mesh = mesh.scaled(scale);
    let area = mesh.surface_area();
    debug!(
        "label {label}: {} face(s), area {area:.4} with scale {scale:?}",
        mesh.faces().len()
    );

    Ok(CellSurface {
        region,
        mesh,
        order,
        scale,
        area,
        unit: volume.spacing().along(spec.reference()),
    })
}

/// 测量标签为 `label` 的细胞的表面积.
pub fn measure_region(
    volume: &LabelVolume,
    label: LabelId,
    spec: &SurfaceSpec,
) -> Result<CellSurface, PipelineError> {
    if label == BACKGROUND {
        return Err(PipelineError::MissingLabel(label));
    }
    let region = volume
        .region(label)
        .ok_or(PipelineError::MissingLabel(label))?;
    measure(volume, region, spec)
}

/// 测量体数据中所有细胞的表面积, 按标签升序排列.
pub fn measure_all(volume: &LabelVolume, spec: &SurfaceSpec) -> Vec<Result<CellSurface, PipelineError>> {
    let regions = volume.regions();
    info!("measuring {} region(s)", regions.len());

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            use rayon::prelude::*;
            regions
                .into_par_iter()
                .map(|r| measure(volume, r, spec))
                .collect()
        } else {
            regions
                .into_iter()
                .map(|r| measure(volume, r, spec))
                .collect()
        }
    }
}

/// 读取标签体数据并测量 `label`. `spacing` 非空时覆盖文件自带的体素间距.
pub fn measure_file<P: AsRef<Path>>(
    path: P,
    spacing: Option<Spacing>,
    label: LabelId,
    spec: &SurfaceSpec,
) -> Result<CellSurface, PipelineError> {
    let mut volume = LabelVolume::open(path)?;
    if let Some(s) = spacing {
        volume = volume.with_spacing(s);
    }
    measure_region(&volume, label, spec)
}
