use std::ops::Range;

use ndarray::{Array2, ArrayView3, Zip};

use crate::{Axis3, IntensityVolume, VolumeAttr};

/// 沿 `axis` 的最大强度投影. 返回的二维数组由剩余两个轴按原顺序组成.
///
/// `NaN` 被忽略; 若一条投影线上全为 `NaN`, 结果为负无穷.
/// 沿 `axis` 长度为 `0` 时结果全为负无穷.
pub fn max_projection(volume: &IntensityVolume, axis: Axis3) -> Array2<f32> {
    project(volume.data(), axis)
}

/// 同 [`max_projection`], 但只使用 `axis` 方向上 `range` 范围内的层.
///
/// 当 `range` 为空或越界时返回 `None`.
pub fn max_projection_range(
    volume: &IntensityVolume,
    axis: Axis3,
    range: Range<usize>,
) -> Option<Array2<f32>> {
    let (z, h, w) = volume.shape();
    let len = [z, h, w][axis.index()];
    if range.start >= range.end || range.end > len {
        return None;
    }
    let mut data = volume.data();
    data.slice_axis_inplace(axis.as_ndarray(), range.into());
    Some(project(data, axis))
}

fn project(data: ArrayView3<'_, f32>, axis: Axis3) -> Array2<f32> {
    let &[z, h, w] = data.shape() else {
        unreachable!()
    };
    let shape = match axis {
        Axis3::Plane => (h, w),
        Axis3::Row => (z, w),
        Axis3::Col => (z, h),
    };
    let mut out = Array2::<f32>::from_elem(shape, f32::NEG_INFINITY);
    let lanes = data.lanes(axis.as_ndarray());
    let zip = Zip::from(&mut out).and(lanes);
    let lane_max = |o: &mut f32, lane: ndarray::ArrayView1<'_, f32>| {
        *o = lane.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    };

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(lane_max);
        } else {
            zip.for_each(lane_max);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Spacing;
    use ndarray::{array, Array3};

    fn toy() -> IntensityVolume {
        let mut data = Array3::<f32>::zeros((3, 2, 4));
        data[(0, 0, 0)] = 5.0;
        data[(2, 0, 0)] = 7.0;
        data[(1, 1, 3)] = f32::NAN;
        data[(2, 1, 3)] = -1.0;
        data[(0, 1, 3)] = -2.0;
        data[(1, 1, 2)] = 9.0;
        IntensityVolume::from_array(data, Spacing::isotropic())
    }

    #[test]
    fn test_max_projection_along_planes() {
        let p = max_projection(&toy(), Axis3::Plane);
        assert_eq!(p.dim(), (2, 4));
        assert_eq!(p, array![[7.0, 0.0, 0.0, 0.0], [0.0, 0.0, 9.0, -1.0]]);
    }

    #[test]
    fn test_max_projection_other_axes() {
        let p = max_projection(&toy(), Axis3::Col);
        assert_eq!(p.dim(), (3, 2));
        assert_eq!(p[(0, 0)], 5.0);
        assert_eq!(p[(1, 1)], 9.0);
        let p = max_projection(&toy(), Axis3::Row);
        assert_eq!(p.dim(), (3, 4));
        assert_eq!(p[(2, 0)], 7.0);
    }

    #[test]
    fn test_max_projection_range() {
        let v = toy();
        let p = max_projection_range(&v, Axis3::Plane, 0..1).unwrap();
        assert_eq!(p[(0, 0)], 5.0);
        assert_eq!(p[(1, 3)], -2.0);
        let p = max_projection_range(&v, Axis3::Plane, 1..2).unwrap();
        assert_eq!(p[(1, 3)], f32::NEG_INFINITY);
        assert!(max_projection_range(&v, Axis3::Plane, 2..2).is_none());
        assert!(max_projection_range(&v, Axis3::Plane, 1..4).is_none());
    }
}
