//! 标签区域 (细胞) 的描述与掩膜提取.
//!
//! 所有区域描述在一次遍历中得到. 掩膜按区域包围盒裁剪,
//! 并在四周补充背景体素, 以保证后续提取的等值面是封闭的.

use std::collections::BTreeMap;

use log::debug;
use ndarray::{s, Array3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::BACKGROUND;
use crate::{Idx3d, LabelId, LabelVolume, VolumeAttr};

mod components;
mod mask;

pub use components::label_components;
pub use mask::{BinaryMask, CompactMask, PLANE_ROW_COL, ROW_COL_PLANE};

/// 轴对齐包围盒. 按 `(z, h, w)` 存储, 下界包含, 上界不包含.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    min: Idx3d,
    max: Idx3d,
}

impl BoundingBox {
    /// 构建包围盒. 任一方向上 `min >= max` (即空盒) 时返回 `None`.
    pub fn new(min: Idx3d, max: Idx3d) -> Option<BoundingBox> {
        (min.0 < max.0 && min.1 < max.1 && min.2 < max.2).then_some(Self { min, max })
    }

    /// 只包含一个体素的包围盒.
    #[inline]
    fn single(pos: Idx3d) -> BoundingBox {
        Self {
            min: pos,
            max: (pos.0 + 1, pos.1 + 1, pos.2 + 1),
        }
    }

    /// 扩张以包含 `pos`.
    #[inline]
    fn include(&mut self, (z, h, w): Idx3d) {
        self.min = (self.min.0.min(z), self.min.1.min(h), self.min.2.min(w));
        self.max = (
            self.max.0.max(z + 1),
            self.max.1.max(h + 1),
            self.max.2.max(w + 1),
        );
    }

    /// 下界 (包含).
    #[inline]
    pub fn min(&self) -> Idx3d {
        self.min
    }

    /// 上界 (不包含).
    #[inline]
    pub fn max(&self) -> Idx3d {
        self.max
    }

    /// 包围盒大小 `(z, h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        (
            self.max.0 - self.min.0,
            self.max.1 - self.min.1,
            self.max.2 - self.min.2,
        )
    }

    /// 包围盒包含的体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 判断 `pos` 是否位于包围盒内.
    #[inline]
    pub fn contains(&self, &(z, h, w): &Idx3d) -> bool {
        (self.min.0..self.max.0).contains(&z)
            && (self.min.1..self.max.1).contains(&h)
            && (self.min.2..self.max.2).contains(&w)
    }
}

/// 一个标签区域的描述.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    label: LabelId,
    bbox: BoundingBox,
    count: usize,
    centroid: [f64; 3],
}

impl Region {
    /// 区域标签值.
    #[inline]
    pub fn label(&self) -> LabelId {
        self.label
    }

    /// 区域包围盒.
    #[inline]
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// 区域体素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// 区域质心 `(z, h, w)`, 以体素为单位.
    #[inline]
    pub fn centroid(&self) -> [f64; 3] {
        self.centroid
    }

    /// 区域占据的物理体积, 即体素个数乘以单个体素体积.
    #[inline]
    pub fn physical_volume<V: VolumeAttr>(&self, volume: &V) -> f64 {
        self.count as f64 * volume.voxel()
    }
}

/// 单次遍历时每个标签维护的累积量.
struct Accumulator {
    bbox: BoundingBox,
    count: usize,
    sum: [f64; 3],
}

impl Accumulator {
    #[inline]
    fn new(pos: Idx3d) -> Self {
        Self {
            bbox: BoundingBox::single(pos),
            count: 0,
            sum: [0.0; 3],
        }
    }

    #[inline]
    fn push(&mut self, pos @ (z, h, w): Idx3d) {
        self.bbox.include(pos);
        self.count += 1;
        self.sum[0] += z as f64;
        self.sum[1] += h as f64;
        self.sum[2] += w as f64;
    }

    fn finish(self, label: LabelId) -> Region {
        let n = self.count as f64;
        Region {
            label,
            bbox: self.bbox,
            count: self.count,
            centroid: self.sum.map(|s| s / n),
        }
    }
}

impl LabelVolume {
    /// 一次遍历获取所有非背景标签的区域描述, 按标签升序排列.
    pub fn regions(&self) -> Vec<Region> {
        let mut acc = BTreeMap::<LabelId, Accumulator>::new();
        for (pos, &label) in self.data().indexed_iter() {
            if label == BACKGROUND {
                continue;
            }
            acc.entry(label)
                .or_insert_with(|| Accumulator::new(pos))
                .push(pos);
        }
        debug!("found {} region(s) in volume {:?}", acc.len(), self.shape());
        acc.into_iter().map(|(l, a)| a.finish(l)).collect()
    }

    /// 获取标签 `label` 的区域描述. 标签不存在 (或为背景) 时返回 `None`.
    pub fn region(&self, label: LabelId) -> Option<Region> {
        if label == BACKGROUND {
            return None;
        }
        let mut acc: Option<Accumulator> = None;
        for (pos, &p) in self.data().indexed_iter() {
            if p == label {
                acc.get_or_insert_with(|| Accumulator::new(pos)).push(pos);
            }
        }
        acc.map(|a| a.finish(label))
    }

    /// 获取 `region` 的二值掩膜. 掩膜裁剪到区域包围盒, 并在每个方向的两侧各补充
    /// `pad` 层背景体素. 掩膜原点在体数据中的坐标 (可能为负) 会被记录下来.
    ///
    /// `region` 应当来自于本体数据, 否则程序可能 panic.
    pub fn region_mask(&self, region: &Region, pad: usize) -> BinaryMask {
        let bbox = region.bbox();
        let (z0, h0, w0) = bbox.min();
        let (z1, h1, w1) = bbox.max();
        let (dz, dh, dw) = bbox.shape();

        let mut data = Array3::from_elem((dz + 2 * pad, dh + 2 * pad, dw + 2 * pad), false);
        let crop = self.data().slice_move(s![z0..z1, h0..h1, w0..w1]);
        for ((z, h, w), &p) in crop.indexed_iter() {
            if p == region.label() {
                data[(z + pad, h + pad, w + pad)] = true;
            }
        }

        let pad = pad as isize;
        let origin = [z0 as isize - pad, h0 as isize - pad, w0 as isize - pad];
        BinaryMask::with_origin(data, self.spacing(), origin, PLANE_ROW_COL)
    }

    /// 获取与本体数据同样大小的标签 `label` 二值掩膜. 不做裁剪.
    pub fn mask_of(&self, label: LabelId) -> BinaryMask {
        BinaryMask::from_array(self.data().mapv(|p| p == label), self.spacing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Spacing;

    fn toy_volume() -> LabelVolume {
        let mut data = Array3::<LabelId>::zeros((4, 5, 6));
        // 标签 2: 2x2x1 的小块
        for (z, h) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            data[(z, h, 3)] = 2;
        }
        // 标签 9: 两个分散的点
        data[(0, 0, 0)] = 9;
        data[(3, 4, 5)] = 9;
        LabelVolume::from_array(data, Spacing::new(2.0, 1.0, 1.0).unwrap())
    }

    #[test]
    fn test_regions_in_one_pass() {
        let v = toy_volume();
        let regions = v.regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].label(), 2);
        assert_eq!(regions[1].label(), 9);

        let r2 = &regions[0];
        assert_eq!(r2.count(), 4);
        assert_eq!(r2.bbox().min(), (1, 1, 3));
        assert_eq!(r2.bbox().max(), (3, 3, 4));
        assert_eq!(r2.centroid(), [1.5, 1.5, 3.0]);
        assert_eq!(r2.physical_volume(&v), 8.0);

        let r9 = &regions[1];
        assert_eq!(r9.bbox().shape(), (4, 5, 6));
        assert_eq!(r9.centroid(), [1.5, 2.0, 2.5]);
        assert_eq!(v.region(9).as_ref(), Some(r9));
        assert_eq!(v.region(4), None);
        assert_eq!(v.region(BACKGROUND), None);
    }

    #[test]
    fn test_region_mask_with_padding() {
        let v = toy_volume();
        let r = v.region(2).unwrap();
        let m = v.region_mask(&r, 1);
        assert_eq!(m.shape(), (4, 4, 3));
        assert_eq!(m.origin(), [0, 0, 2]);
        assert_eq!(m.count(), 4);
        assert!(m.data()[(1, 1, 1)]);
        assert!(!m.data()[(0, 0, 0)]);

        // 补边可以越过体数据边界.
        let r9 = v.region(9).unwrap();
        let m9 = v.region_mask(&r9, 2);
        assert_eq!(m9.shape(), (8, 9, 10));
        assert_eq!(m9.origin(), [-2, -2, -2]);
        assert_eq!(m9.count(), 2);
        assert!(m9.data()[(2, 2, 2)]);
    }

    #[test]
    fn test_mask_of() {
        let v = toy_volume();
        let m = v.mask_of(9);
        assert_eq!(m.shape(), v.shape());
        assert_eq!(m.count(), 2);
        assert_eq!(m.origin(), [0, 0, 0]);
    }

    #[test]
    fn test_bounding_box() {
        assert!(BoundingBox::new((0, 0, 0), (1, 0, 1)).is_none());
        let b = BoundingBox::new((1, 1, 1), (3, 4, 5)).unwrap();
        assert_eq!(b.size(), 24);
        assert!(b.contains(&(2, 3, 4)));
        assert!(!b.contains(&(3, 3, 4)));
    }
}
