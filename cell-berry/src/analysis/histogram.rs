use itertools::{Itertools, MinMaxResult};
use num::Float;
use ordered_float::NotNan;

/// 等宽直方图. 只统计有限值.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    lo: f64,
    hi: f64,
    counts: Vec<u64>,
}

impl Histogram {
    /// 以 `bins` 个等宽分箱统计 `values` 中的有限值, 范围取其最小值和最大值.
    ///
    /// 不存在有限值时返回 `None`. `bins` 为 `0` 时程序 panic.
    pub fn new<T: Float, I: IntoIterator<Item = T>>(values: I, bins: usize) -> Option<Histogram> {
        assert!(bins > 0, "histogram needs at least one bin");
        let finite: Vec<f64> = values
            .into_iter()
            .filter_map(|v| v.to_f64())
            .filter(|v| v.is_finite())
            .collect();
        let (lo, hi) = match finite.iter().filter_map(|&v| NotNan::new(v).ok()).minmax() {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(v) => (*v, *v),
            MinMaxResult::MinMax(a, b) => (*a, *b),
        };
        let mut ans = Self {
            lo,
            hi,
            counts: vec![0; bins],
        };
        for v in finite {
            let b = ans.bin_of(v);
            ans.counts[b] += 1;
        }
        Some(ans)
    }

    /// 分箱个数.
    #[inline]
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// 每个分箱的计数.
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// 统计的值的总个数.
    #[inline]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// 统计范围 `(min, max)`.
    #[inline]
    pub fn range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// 分箱宽度. 常数数据时为 `0`.
    #[inline]
    pub fn bin_width(&self) -> f64 {
        (self.hi - self.lo) / self.bins() as f64
    }

    /// 值 `v` 所在的分箱. 范围外的值归入两端分箱.
    #[inline]
    pub fn bin_of(&self, v: f64) -> usize {
        let w = self.bin_width();
        if w <= 0.0 || v.is_nan() {
            return 0;
        }
        (((v - self.lo) / w).floor().max(0.0) as usize).min(self.bins() - 1)
    }

    /// 第 `i` 个分箱的中心.
    #[inline]
    pub fn bin_center(&self, i: usize) -> f64 {
        self.lo + (i as f64 + 0.5) * self.bin_width()
    }

    /// 归一化累积分布: 第 `i` 项为落在前 `i + 1` 个分箱中的值所占的比例.
    pub fn cdf(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.counts
            .iter()
            .scan(0u64, |acc, &c| {
                *acc += c;
                Some(*acc as f64 / total)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Histogram;

    #[test]
    fn test_histogram() {
        let h = Histogram::new([0.0f32, 1.0, 2.0, 3.0, f32::NAN, 4.0], 4).unwrap();
        assert_eq!(h.range(), (0.0, 4.0));
        assert_eq!(h.counts(), &[1, 1, 1, 2]);
        assert_eq!(h.total(), 5);
        assert_eq!(h.bin_center(0), 0.5);
        assert_eq!(h.cdf(), vec![0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn test_degenerate_histograms() {
        assert!(Histogram::new([f32::NAN, f32::INFINITY], 8).is_none());
        assert!(Histogram::new(Vec::<f64>::new(), 8).is_none());
        let h = Histogram::new([2.5f64; 3], 8).unwrap();
        assert_eq!(h.counts()[0], 3);
        assert_eq!(h.bin_width(), 0.0);
    }
}
