use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};

use ndarray::{Array3, ArrayView, ArrayView3, Axis, Ix3};

use crate::consts::BACKGROUND;
use crate::{Idx2d, Idx3d, LabelId};

mod error;
pub mod io;
pub mod slice;
mod spacing;
mod window;

pub use error::LoadError;

pub use slice::{ImgWriteRaw, ImgWriteVis, IntensitySlice, LabelSlice};

#[cfg(feature = "plot")]
pub use slice::ImgDisplay;

pub use spacing::{Axis3, InvalidSpacing, Spacing};
pub use window::IntensityWindow;

/// 3D 体数据的共用属性和部分通用操作.
///
/// 所有体数据都按照 `(plane, row, col)` 即 `(z, h, w)` 存储.
pub trait VolumeAttr {
    /// 获取数据形状大小 `(z, h, w)`.
    fn shape(&self) -> Idx3d;

    /// 获取体素间距.
    fn spacing(&self) -> Spacing;

    /// 获取数据水平切片形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 数据是否不含任何体素?
    #[inline]
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取单个体素的实际体积值.
    #[inline]
    fn voxel(&self) -> f64 {
        self.spacing().voxel()
    }

    /// 获取水平切片方向的像素实际面积值.
    #[inline]
    fn slice_pixel(&self) -> f64 {
        let s = self.spacing();
        s.height() * s.width()
    }

    /// 获取 `pos` 前后上下左右六个点的坐标.
    ///
    /// 在数据范围外的坐标会被过滤掉, 不会包含在返回值中.
    fn diamond_neighbours(&self, (z, h, w): Idx3d) -> Vec<Idx3d> {
        [
            (z.wrapping_sub(1), h, w),
            (z.saturating_add(1), h, w),
            (z, h.wrapping_sub(1), w),
            (z, h.saturating_add(1), w),
            (z, h, w.wrapping_sub(1)),
            (z, h, w.saturating_add(1)),
        ]
        .into_iter()
        .filter(|p| self.check(p))
        .collect()
    }
}

/// 形如 `(z, h, w)` 的 `ndarray` 形状转换为元组.
#[inline]
pub(crate) fn shape_of<T>(data: &ArrayView3<T>) -> Idx3d {
    let &[z, h, w] = data.shape() else {
        unreachable!()
    };
    (z, h, w)
}

/// 标签化 3D 体数据 (分割结果). 标签值以 [`LabelId`] 保存, `0` 为背景.
#[derive(Debug, Clone)]
pub struct LabelVolume {
    spacing: Spacing,
    data: Array3<LabelId>,
}

impl VolumeAttr for LabelVolume {
    #[inline]
    fn shape(&self) -> Idx3d {
        shape_of(&self.data.view())
    }

    #[inline]
    fn spacing(&self) -> Spacing {
        self.spacing
    }
}

impl Index<Idx3d> for LabelVolume {
    type Output = LabelId;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for LabelVolume {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl LabelVolume {
    /// 由按 `(z, h, w)` 组织的标签数组和体素间距直接创建.
    #[inline]
    pub fn from_array(data: Array3<LabelId>, spacing: Spacing) -> Self {
        Self { spacing, data }
    }

    /// 替换体素间距, 例如当文件本身不携带分辨率信息时.
    #[inline]
    pub fn with_spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = spacing;
        self
    }

    /// 获取 3D 标签 z 空间的第 `z_index` 层不可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> LabelSlice<'_> {
        LabelSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代 3D 标签水平不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = LabelSlice<'_>> {
        self.data.axis_iter(Axis(0)).map(LabelSlice::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, LabelId, Ix3> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<LabelId> {
        self.data
    }

    /// 获取值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: LabelId) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 获取所有出现过的非背景标签, 按升序排列.
    pub fn labels(&self) -> Vec<LabelId> {
        self.data
            .iter()
            .copied()
            .filter(|&p| p != BACKGROUND)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 该体数据是否为全背景?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().all(|p| *p == BACKGROUND)
    }
}

/// 强度 3D 体数据 (显微原始图像). 强度以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct IntensityVolume {
    spacing: Spacing,
    data: Array3<f32>,
}

impl VolumeAttr for IntensityVolume {
    #[inline]
    fn shape(&self) -> Idx3d {
        shape_of(&self.data.view())
    }

    #[inline]
    fn spacing(&self) -> Spacing {
        self.spacing
    }
}

impl Index<Idx3d> for IntensityVolume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for IntensityVolume {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl IntensityVolume {
    /// 由按 `(z, h, w)` 组织的强度数组和体素间距直接创建.
    #[inline]
    pub fn from_array(data: Array3<f32>, spacing: Spacing) -> Self {
        Self { spacing, data }
    }

    /// 替换体素间距.
    #[inline]
    pub fn with_spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = spacing;
        self
    }

    /// 获取 3D 图像 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> IntensitySlice<'_> {
        IntensitySlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代 3D 图像水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = IntensitySlice<'_>> {
        self.data.axis_iter(Axis(0)).map(IntensitySlice::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<f32> {
        self.data
    }

    /// 获取所有有限强度值中的最小值和最大值. 若不存在有限值则返回 `None`.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn toy_labels() -> LabelVolume {
        let mut data = Array3::<LabelId>::zeros((2, 3, 4));
        data[(0, 0, 0)] = 7;
        data[(1, 2, 3)] = 7;
        data[(1, 1, 1)] = 3;
        LabelVolume::from_array(data, Spacing::new(2.0, 0.5, 0.5).unwrap())
    }

    #[test]
    fn test_label_volume_attr() {
        let v = toy_labels();
        assert_eq!(v.shape(), (2, 3, 4));
        assert_eq!(v.slice_shape(), (3, 4));
        assert_eq!(v.len_z(), 2);
        assert_eq!(v.size(), 24);
        assert!(v.check(&(1, 2, 3)));
        assert!(!v.check(&(2, 0, 0)));
        assert_eq!(v.voxel(), 0.5);
        assert_eq!(v.slice_pixel(), 0.25);
    }

    #[test]
    fn test_label_volume_labels() {
        let v = toy_labels();
        assert_eq!(v.labels(), vec![3, 7]);
        assert_eq!(v.count(7), 2);
        assert_eq!(v.count(0), 21);
        assert!(!v.is_background());
        assert_eq!(v.slice_iter().len(), 2);
        assert_eq!(v.slice_at(1)[(2, 3)], 7);
    }

    #[test]
    fn test_diamond_neighbours_at_corner() {
        let v = toy_labels();
        let mut n = v.diamond_neighbours((0, 0, 0));
        n.sort();
        assert_eq!(n, vec![(0, 0, 1), (0, 1, 0), (1, 0, 0)]);
        assert_eq!(v.diamond_neighbours((1, 1, 1)).len(), 5);
    }

    #[test]
    fn test_intensity_min_max() {
        let mut data = Array3::<f32>::zeros((1, 2, 2));
        data[(0, 0, 0)] = f32::NAN;
        data[(0, 0, 1)] = -3.0;
        data[(0, 1, 1)] = 9.0;
        let v = IntensityVolume::from_array(data, Spacing::isotropic());
        assert_eq!(v.min_max(), Some((-3.0, 9.0)));

        let empty = IntensityVolume::from_array(Array3::zeros((0, 2, 2)), Spacing::isotropic());
        assert!(empty.is_empty());
        assert_eq!(empty.min_max(), None);
    }
}
