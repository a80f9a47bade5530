use ordered_float::OrderedFloat;

use super::Histogram;
use crate::region::BinaryMask;
use crate::{IntensityVolume, VolumeAttr};

/// Otsu 阈值: 最大化前景 (严格大于阈值) 与背景之间方差的分箱中心.
///
/// 不存在有限值, 或所有有限值都相同时返回 `None`. `bins` 为 `0` 时程序 panic.
pub fn otsu_threshold<I: IntoIterator<Item = f32>>(values: I, bins: usize) -> Option<f32> {
    let hist = Histogram::new(values, bins)?;
    if hist.bin_width() <= 0.0 || bins < 2 {
        return None;
    }
    let counts: Vec<f64> = hist.counts().iter().map(|&c| c as f64).collect();
    let centers: Vec<f64> = (0..bins).map(|i| hist.bin_center(i)).collect();

    // 前 i + 1 个分箱 (背景) 的权重和加权和
    let mut w_lo = Vec::with_capacity(bins);
    let mut s_lo = Vec::with_capacity(bins);
    let (mut w, mut s) = (0.0, 0.0);
    for (c, x) in counts.iter().zip(&centers) {
        w += c;
        s += c * x;
        w_lo.push(w);
        s_lo.push(s);
    }
    let (w_all, s_all) = (w, s);

    let (best, _) = (0..bins - 1)
        .filter_map(|i| {
            let w0 = w_lo[i];
            let w1 = w_all - w0;
            if w0 <= 0.0 || w1 <= 0.0 {
                return None;
            }
            let m0 = s_lo[i] / w0;
            let m1 = (s_all - s_lo[i]) / w1;
            Some((i, w0 * w1 * (m0 - m1).powi(2)))
        })
        .max_by_key(|&(_, var)| OrderedFloat(var))?;
    Some(centers[best] as f32)
}

/// 以阈值 `t` 二值化: 严格大于 `t` 的体素为前景.
pub fn threshold_mask(volume: &IntensityVolume, t: f32) -> BinaryMask {
    BinaryMask::from_array(volume.data().mapv(|v| v > t), volume.spacing())
}
