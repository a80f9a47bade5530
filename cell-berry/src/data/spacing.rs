//! 体素间距 (各向异性分辨率).

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 体数据的三个轴.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis3 {
    /// 相邻切片方向 (z).
    Plane,

    /// 自然图像的垂直方向 (h).
    Row,

    /// 自然图像的水平方向 (w).
    Col,
}

impl Axis3 {
    /// 以 `(plane, row, col)` 存储时该轴的下标.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis3::Plane => 0,
            Axis3::Row => 1,
            Axis3::Col => 2,
        }
    }

    /// 由 `(plane, row, col)` 下标反求轴. 越界时返回 `None`.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Axis3> {
        match index {
            0 => Some(Axis3::Plane),
            1 => Some(Axis3::Row),
            2 => Some(Axis3::Col),
            _ => None,
        }
    }

    /// 转换为 `ndarray` 的轴.
    #[inline]
    pub const fn as_ndarray(self) -> ndarray::Axis {
        ndarray::Axis(self.index())
    }
}

/// 单个体素在三个方向上的物理尺寸, 按 `(plane, row, col)` 存储.
///
/// 单位由数据来源决定 (通常为微米). 三个分量总是有限正数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawSpacing")
)]
pub struct Spacing {
    zhw: [f64; 3],
}

/// 体素间距存在非正或非有限分量, 按 `(plane, row, col)` 给出原始值.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidSpacing(pub [f64; 3]);

impl fmt::Display for InvalidSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spacing {:?} must be finite and positive", self.0)
    }
}

impl std::error::Error for InvalidSpacing {}

/// 反序列化得到的未检查间距.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSpacing {
    zhw: [f64; 3],
}

#[cfg(feature = "serde")]
impl TryFrom<RawSpacing> for Spacing {
    type Error = InvalidSpacing;

    fn try_from(raw: RawSpacing) -> Result<Self, Self::Error> {
        Spacing::from_array(raw.zhw).ok_or(InvalidSpacing(raw.zhw))
    }
}

impl Default for Spacing {
    #[inline]
    fn default() -> Self {
        Self::isotropic()
    }
}

impl Spacing {
    /// 构建体素间距. 任一分量非正或非有限时返回 `None`.
    pub fn new(z: f64, h: f64, w: f64) -> Option<Spacing> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        (valid(z) && valid(h) && valid(w)).then_some(Self { zhw: [z, h, w] })
    }

    /// 从 `(plane, row, col)` 数组构建. 规则同 [`Self::new`].
    #[inline]
    pub fn from_array([z, h, w]: [f64; 3]) -> Option<Spacing> {
        Self::new(z, h, w)
    }

    /// 各向同性的单位间距 `(1, 1, 1)`.
    #[inline]
    pub const fn isotropic() -> Spacing {
        Self { zhw: [1.0; 3] }
    }

    /// 以 `(plane, row, col)` 顺序获取三个分量.
    #[inline]
    pub const fn as_array(&self) -> [f64; 3] {
        self.zhw
    }

    /// 获取某个轴上的间距.
    #[inline]
    pub const fn along(&self, axis: Axis3) -> f64 {
        self.zhw[axis.index()]
    }

    /// 相邻切片方向的间距.
    #[inline]
    pub const fn z(&self) -> f64 {
        self.zhw[0]
    }

    /// 垂直方向的间距.
    #[inline]
    pub const fn height(&self) -> f64 {
        self.zhw[1]
    }

    /// 水平方向的间距.
    #[inline]
    pub const fn width(&self) -> f64 {
        self.zhw[2]
    }

    /// 单个体素的体积.
    #[inline]
    pub fn voxel(&self) -> f64 {
        self.zhw.iter().product()
    }

    /// 三个方向的间距是否完全相同?
    #[inline]
    pub fn is_isotropic(&self) -> bool {
        let [z, h, w] = self.zhw;
        z == h && z == w
    }

    /// 归一化: 每个分量除以参考轴 `reference` 上的分量.
    ///
    /// 返回值仍按 `(plane, row, col)` 排列, 参考轴分量严格等于 `1.0`
    /// (`x / x` 对有限正数总是精确的). 于是以归一化间距缩放的网格,
    /// 其坐标单位是参考轴物理间距的整数倍.
    pub fn normalized(&self, reference: Axis3) -> [f64; 3] {
        let r = self.along(reference);
        self.zhw.map(|v| v / r)
    }

    /// 按照 `order` 给出的轴顺序重排分量. `order[i]` 是新第 `i` 轴对应的原轴.
    ///
    /// 例如 `[Axis3::Row, Axis3::Col, Axis3::Plane]` 给出 `(row, col, plane)` 顺序.
    #[inline]
    pub fn permuted(&self, order: [Axis3; 3]) -> [f64; 3] {
        order.map(|a| self.along(a))
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis3, Spacing};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_spacing_invalid_input() {
        assert!(Spacing::new(0.0, 1.0, 1.0).is_none());
        assert!(Spacing::new(1.0, -0.2, 1.0).is_none());
        assert!(Spacing::new(1.0, 1.0, f64::NAN).is_none());
        assert!(Spacing::new(f64::INFINITY, 1.0, 1.0).is_none());
        assert!(Spacing::new(0.29, 0.065, 0.065).is_some());
    }

    #[test]
    fn test_reference_component_is_exactly_one() {
        let s = Spacing::new(0.29, 0.065, 0.065).unwrap();
        for axis in [Axis3::Plane, Axis3::Row, Axis3::Col] {
            let n = s.normalized(axis);
            assert_eq!(n[axis.index()], 1.0);
        }

        // 一些不易整除的值.
        for v in [0.1, 0.3, 1.0 / 3.0, 7.77e-5, 12345.678] {
            let s = Spacing::new(v, 0.5, 2.0).unwrap();
            assert_eq!(s.normalized(Axis3::Plane)[0], 1.0);
        }
    }

    #[test]
    fn test_normalized_ratio() {
        let s = Spacing::new(0.29, 0.065, 0.065).unwrap();
        let [z, h, w] = s.normalized(Axis3::Row);
        assert!(f64_eq(z, 0.29 / 0.065));
        assert_eq!(h, 1.0);
        assert_eq!(w, 1.0);
    }

    #[test]
    fn test_permuted_and_voxel() {
        let s = Spacing::new(3.0, 2.0, 1.0).unwrap();
        assert_eq!(
            s.permuted([Axis3::Row, Axis3::Col, Axis3::Plane]),
            [2.0, 1.0, 3.0]
        );
        assert!(f64_eq(s.voxel(), 6.0));
        assert!(!s.is_isotropic());
        assert!(Spacing::isotropic().is_isotropic());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rechecks() {
        let s = Spacing::new(0.29, 0.065, 0.065).unwrap();
        let bytes = bincode::serialize(&s).unwrap();
        assert_eq!(bincode::deserialize::<Spacing>(&bytes).unwrap(), s);

        // 与 `Spacing` 编码相同的三个分量, 其中一个为负.
        let bytes = bincode::serialize(&[0.29f64, -0.065, 0.065]).unwrap();
        let err = bincode::deserialize::<Spacing>(&bytes).unwrap_err();
        assert!(err.to_string().contains("finite and positive"), "{err}");
    }

    #[test]
    fn test_axis_round_trip() {
        for i in 0..3 {
            assert_eq!(Axis3::from_index(i).unwrap().index(), i);
        }
        assert_eq!(Axis3::from_index(3), None);
    }
}
