use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::{Array3, ArrayView3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::shape_of;
use crate::{Axis3, Idx3d, Spacing};

/// 体数据的存储轴顺序 `(plane, row, col)`.
pub const PLANE_ROW_COL: [Axis3; 3] = [Axis3::Plane, Axis3::Row, Axis3::Col];

/// 等值面提取使用的轴顺序 `(row, col, plane)`.
pub const ROW_COL_PLANE: [Axis3; 3] = [Axis3::Row, Axis3::Col, Axis3::Plane];

/// 三维二值掩膜.
///
/// 除数据外, 还记录了物理体素间距, 掩膜原点在来源体数据中的坐标,
/// 以及当前的轴顺序. 后两者都按当前轴顺序排列.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinaryMask {
    data: Array3<bool>,
    spacing: Spacing,
    origin: [isize; 3],
    order: [Axis3; 3],
}

impl BinaryMask {
    /// 由按 `(z, h, w)` 组织的数组直接创建, 原点为 `0`.
    #[inline]
    pub fn from_array(data: Array3<bool>, spacing: Spacing) -> Self {
        Self::with_origin(data, spacing, [0; 3], PLANE_ROW_COL)
    }

    #[inline]
    pub(crate) fn with_origin(
        data: Array3<bool>,
        spacing: Spacing,
        origin: [isize; 3],
        order: [Axis3; 3],
    ) -> Self {
        Self {
            data,
            spacing,
            origin,
            order,
        }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, bool> {
        self.data.view()
    }

    /// 按当前轴顺序的形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        shape_of(&self.data.view())
    }

    /// 当前轴顺序. `order()[i]` 是第 `i` 个数组轴对应的物理轴.
    #[inline]
    pub fn order(&self) -> [Axis3; 3] {
        self.order
    }

    /// 物理体素间距, 总是按 `(plane, row, col)` 解释.
    #[inline]
    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    /// 按当前轴顺序排列的体素间距.
    #[inline]
    pub fn axis_spacing(&self) -> [f64; 3] {
        self.spacing.permuted(self.order)
    }

    /// 掩膜原点在来源体数据中的体素坐标, 按当前轴顺序排列.
    #[inline]
    pub fn origin(&self) -> [isize; 3] {
        self.origin
    }

    /// 前景体素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|p| **p).count()
    }

    /// 掩膜中是否不含前景体素?
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|p| *p)
    }

    /// 重排数组轴, 得到按 `order` 组织的新掩膜. 间距与原点随之重排.
    ///
    /// `order` 必须是三个轴的一个排列, 否则程序 panic.
    pub fn permuted(&self, order: [Axis3; 3]) -> BinaryMask {
        let perm = order.map(|axis| {
            self.order
                .iter()
                .position(|&a| a == axis)
                .expect("`order` must be a permutation of the three axes")
        });
        assert!(
            perm[0] != perm[1] && perm[1] != perm[2] && perm[0] != perm[2],
            "`order` must be a permutation of the three axes"
        );
        let data = self
            .data
            .view()
            .permuted_axes(perm)
            .as_standard_layout()
            .into_owned();
        Self {
            data,
            spacing: self.spacing,
            origin: perm.map(|p| self.origin[p]),
            order,
        }
    }

    /// 重排为 `(row, col, plane)` 顺序, 即等值面提取所使用的顺序.
    #[inline]
    pub fn to_row_col_plane(&self) -> BinaryMask {
        self.permuted(ROW_COL_PLANE)
    }

    /// 转换为标量场: 前景为 `1.0`, 背景为 `0.0`.
    #[inline]
    pub fn to_field(&self) -> Array3<f32> {
        self.data.mapv(|p| if p { 1.0 } else { 0.0 })
    }

    /// 压缩数据. 适合同时在内存中保留大量区域的掩膜.
    pub fn compress(&self) -> CompactMask {
        let buf: Vec<u8> = self.data.iter().map(|&p| p as u8).collect();
        let mut e = ZlibEncoder::new(Vec::with_capacity(8), Compression::best());
        // 写入 `Vec` 不会失败.
        e.write_all(&buf).expect("Compression error");
        CompactMask {
            buf: e.finish().expect("Compression error"),
            shape: self.shape(),
            spacing: self.spacing,
            origin: self.origin,
            order: self.order,
        }
    }
}

/// 压缩存储的 [`BinaryMask`]; 不透明类型.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactMask {
    /// 压缩的不透明字节流.
    buf: Vec<u8>,
    shape: Idx3d,
    spacing: Spacing,
    origin: [isize; 3],
    order: [Axis3; 3],
}

impl CompactMask {
    /// 压缩后的字节数.
    #[inline]
    pub fn compressed_len(&self) -> usize {
        self.buf.len()
    }

    /// 解压缩数据. 字节流损坏时返回错误.
    pub fn decompress(&self) -> io::Result<BinaryMask> {
        let (a, b, c) = self.shape;
        let mut d = ZlibDecoder::new(self.buf.as_slice());
        let mut buf = Vec::with_capacity(a * b * c);
        d.read_to_end(&mut buf)?;
        let data = Array3::from_shape_vec(self.shape, buf.into_iter().map(|v| v != 0).collect())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(BinaryMask::with_origin(
            data,
            self.spacing,
            self.origin,
            self.order,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_mask() -> BinaryMask {
        let mut data = Array3::from_elem((2, 3, 4), false);
        data[(0, 1, 2)] = true;
        data[(1, 2, 3)] = true;
        BinaryMask::with_origin(
            data,
            Spacing::new(3.0, 2.0, 1.0).unwrap(),
            [10, 20, 30],
            PLANE_ROW_COL,
        )
    }

    #[test]
    fn test_to_row_col_plane() {
        let m = toy_mask();
        let r = m.to_row_col_plane();
        assert_eq!(r.shape(), (3, 4, 2));
        assert_eq!(r.order(), ROW_COL_PLANE);
        assert_eq!(r.axis_spacing(), [2.0, 1.0, 3.0]);
        assert_eq!(r.origin(), [20, 30, 10]);
        assert!(r.data()[(1, 2, 0)]);
        assert!(r.data()[(2, 3, 1)]);
        assert_eq!(r.count(), 2);

        // 再重排回来.
        assert_eq!(r.permuted(PLANE_ROW_COL), m);
    }

    #[test]
    #[should_panic]
    fn test_permuted_rejects_repeated_axes() {
        toy_mask().permuted([Axis3::Row, Axis3::Row, Axis3::Col]);
    }

    #[test]
    fn test_to_field() {
        let f = toy_mask().to_field();
        assert_eq!(f[(0, 1, 2)], 1.0);
        assert_eq!(f[(0, 0, 0)], 0.0);
        assert_eq!(f.sum(), 2.0);
    }

    #[test]
    fn test_compress() {
        let m = toy_mask().to_row_col_plane();
        let c = m.compress();
        assert!(c.compressed_len() > 0);
        assert_eq!(c.decompress().unwrap(), m);
    }
}
