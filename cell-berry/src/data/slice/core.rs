use crate::consts::BACKGROUND;
use crate::{Idx2d, LabelId};
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, Ix2};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::ops::Index;

/// 不可变、借用的二维水平标签切片.
pub struct LabelSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LabelVolume`].
    data: ArrayView2<'a, LabelId>,
}

impl Index<Idx2d> for LabelSlice<'_> {
    type Output = LabelId;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> LabelSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, LabelId>) -> Self {
        Self { data }
    }

    /// 获得 **底层** 数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<'_, LabelId> {
        self.data.view()
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, LabelId, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&LabelId> {
        self.data.get(pos)
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 判断一个索引是否合法 (未越界).
    #[inline]
    pub fn check(&self, (h, w): Idx2d) -> bool {
        let (h_len, w_len) = self.shape();
        h < h_len && w < w_len
    }

    /// 该图是否为全背景图?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().all(|p| *p == BACKGROUND)
    }

    /// 统计图像中值为 `label` 的像素总个数.
    #[inline]
    pub fn count(&self, label: LabelId) -> usize {
        self.data.iter().filter(|&p| *p == label).count()
    }

    /// 获取该切片上出现的所有非背景标签, 按升序排列.
    pub fn labels(&self) -> Vec<LabelId> {
        self.data
            .iter()
            .copied()
            .filter(|&p| p != BACKGROUND)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 获得行优先存储的序列化数据.
    /// 当原始数据本身就是行优先格式时, 可以避免一次 deepcopy.
    pub fn as_row_major_slice(&self) -> Cow<'_, [LabelId]> {
        match self.data.as_slice() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(self.data.iter().copied().collect()),
        }
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &LabelId)> {
        self.data.indexed_iter()
    }

    /// 克隆自己, 获得一个拥有所有权的底层数组.
    #[inline]
    pub fn to_owned(&self) -> Array2<LabelId> {
        self.data.to_owned()
    }

    /// 获得 `pos` 的 4-邻域像素索引. 保证返回的索引都不越界.
    pub fn n4_positions(&self, (h, w): Idx2d) -> Vec<Idx2d> {
        [
            (h.wrapping_sub(1), w),
            (h.saturating_add(1), w),
            (h, w.wrapping_sub(1)),
            (h, w.saturating_add(1)),
        ]
        .into_iter()
        .filter(|p| self.check(*p))
        .collect()
    }

    /// 判断一个像素是否位于标签 `label` 区域的轮廓上, 即该像素值为 `label`,
    /// 且其 4-邻域中存在其它值或者它位于图像边缘.
    pub fn is_contour(&self, pos: Idx2d, label: LabelId) -> bool {
        if self.get(pos) != Some(&label) {
            return false;
        }
        let n4 = self.n4_positions(pos);
        n4.len() < 4 || n4.into_iter().any(|p| self[p] != label)
    }
}

/// 不可变、借用的二维水平强度切片.
pub struct IntensitySlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::IntensityVolume`].
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for IntensitySlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> IntensitySlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, f32, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f32> {
        self.data.get(pos)
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 强度)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }

    /// 克隆自己, 获得一个拥有所有权的底层数组.
    #[inline]
    pub fn to_owned(&self) -> Array2<f32> {
        self.data.to_owned()
    }
}
