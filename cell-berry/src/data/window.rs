/// 强度显示窗口, 包含窗位 (level) 和窗宽 (width).
///
/// 用于把任意范围的浮点强度映射到 8-bit 灰度. 该窗口是只读的.
/// 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntensityWindow {
    level: f32,
    width: f32,
}

impl IntensityWindow {
    /// 构建显示窗口.
    ///
    /// `level` 必须有限, `width` 必须为有限正数, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<IntensityWindow> {
        if level.is_finite() && width.is_finite() && width > 0.0 {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 由强度下限 `lo` 和上限 `hi` 构建窗口. 需要 `lo < hi` 且二者有限.
    pub fn from_range(lo: f32, hi: f32) -> Option<IntensityWindow> {
        if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
            return None;
        }
        Self::new(lo + (hi - lo) / 2.0, hi - lo)
    }

    /// 覆盖 `[0, 1]` 的窗口, 适合归一化 (如直方图均衡化) 后的数据.
    #[inline]
    pub const fn unit() -> IntensityWindow {
        Self {
            level: 0.5,
            width: 1.0,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 求在当前窗口设置下, 强度 `v` 对应的灰度图像素整数值 (0 <= value <= 255)
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        let lb = self.lower_bound();
        if v <= lb {
            Some(u8::MIN)
        } else if v >= self.upper_bound() {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some((((v - lb) / self.width()) * 255.0) as u8)
        }
    }

    /// 同 [`Self::eval`], 但无意义的值映射为黑色.
    #[inline]
    pub fn eval_or_black(&self, v: f32) -> u8 {
        self.eval(v).unwrap_or(u8::MIN)
    }
}

#[cfg(test)]
mod tests {
    use crate::IntensityWindow;

    fn is_valid_init(level: f32, width: f32) -> bool {
        IntensityWindow::new(level, width).is_some()
    }

    #[test]
    fn test_window_invalid_input() {
        assert!(!is_valid_init(0.0, -1.0));
        assert!(!is_valid_init(0.0, 0.0));
        assert!(!is_valid_init(f32::NAN, 1.0));
        assert!(IntensityWindow::from_range(3.0, 3.0).is_none());
        assert!(IntensityWindow::from_range(4.0, 3.0).is_none());
    }

    #[test]
    fn test_window_generic() {
        // [60, 100]
        let win = IntensityWindow::from_range(60.0, 100.0).unwrap();
        assert_eq!(win.level(), 80.0);
        assert_eq!(win.width(), 40.0);
        assert_eq!(win.eval(f32::NAN), None);
        assert_eq!(win.eval(f32::MIN), Some(0));
        assert_eq!(win.eval(f32::MAX), Some(255));

        assert_eq!(win.eval(50.0), Some(0));
        assert_eq!(win.eval(60.0), Some(0));
        assert_eq!(win.eval(70.0).unwrap(), (255.0 * 0.25) as u8);
        assert_eq!(win.eval(80.0).unwrap(), (255.0 * 0.5) as u8);
        assert_eq!(win.eval(99.999), Some(254));
        assert_eq!(win.eval(100.0), Some(u8::MAX));
    }

    #[test]
    fn test_unit_window() {
        let win = IntensityWindow::unit();
        assert_eq!(win.eval(0.0), Some(0));
        assert_eq!(win.eval(1.0), Some(255));
        assert_eq!(win.eval_or_black(f32::INFINITY), 0);
    }
}
