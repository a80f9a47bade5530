use log::debug;

use super::Histogram;
use crate::{IntensityVolume, VolumeAttr};

/// 将强度裁剪到 `[lo, hi]` 并线性映射到 `[0, 1]`. `NaN` 保持不变.
///
/// `lo`, `hi` 非有限或 `lo >= hi` 时返回 `None`.
pub fn rescale_intensity(volume: &IntensityVolume, (lo, hi): (f32, f32)) -> Option<IntensityVolume> {
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return None;
    }
    let width = hi - lo;
    let data = volume
        .data()
        .mapv(|v| if v.is_nan() { v } else { num::clamp((v - lo) / width, 0.0, 1.0) });
    Some(IntensityVolume::from_array(data, volume.spacing()))
}

/// 全局直方图均衡化. 以 `bins` 个分箱的累积分布把强度映射到 `[0, 1]`.
///
/// 非有限值保持不变; 若不存在有限值, 返回原数据的拷贝. `bins` 为 `0` 时程序 panic.
pub fn equalize_histogram(volume: &IntensityVolume, bins: usize) -> IntensityVolume {
    let Some(hist) = Histogram::new(volume.data().iter().copied(), bins) else {
        return volume.clone();
    };
    let cdf = hist.cdf();
    debug!(
        "equalizing {} values over {:?} with {} bins",
        hist.total(),
        hist.range(),
        bins
    );
    let data = volume.data().mapv(|v| {
        if v.is_finite() {
            cdf[hist.bin_of(v as f64)] as f32
        } else {
            v
        }
    });
    IntensityVolume::from_array(data, volume.spacing())
}
