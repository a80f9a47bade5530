//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, LabelId};

pub use crate::data::slice::{ImgWriteRaw, ImgWriteVis, IntensitySlice, LabelSlice};
pub use crate::data::{
    Axis3, IntensityVolume, IntensityWindow, LabelVolume, LoadError, Spacing, VolumeAttr,
};

#[cfg(feature = "plot")]
pub use crate::data::slice::ImgDisplay;

pub use crate::consts::{BACKGROUND, DEFAULT_BINS, DEFAULT_ISO_LEVEL, DEFAULT_MASK_PADDING};

pub use crate::dataset::{self, home_dataset_dir_with};
pub use crate::io;

pub use crate::mesh::{IsoSurface, Mesh};
pub use crate::pipeline::{measure_all, measure_region, CellSurface, SurfaceSpec};
pub use crate::region::{BinaryMask, Region};
pub use crate::view::SliceViewer;
