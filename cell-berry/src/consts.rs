//! 通用常量.

use crate::LabelId;

/// 背景标签值.
pub const BACKGROUND: LabelId = 0;

/// 二值掩膜转为标量场后, 默认的等值面阈值 (前景 1.0, 背景 0.0 的中点).
pub const DEFAULT_ISO_LEVEL: f32 = 0.5;

/// 提取区域掩膜时, 默认在包围盒外侧补充的背景体素层数.
pub const DEFAULT_MASK_PADDING: usize = 1;

/// 直方图相关算法的默认分箱数.
pub const DEFAULT_BINS: usize = 256;

/// 标签伪彩色.
pub mod palette {
    use super::BACKGROUND;
    use crate::LabelId;

    /// 背景颜色 (黑色).
    pub const BACKGROUND_RGB: [u8; 3] = [0, 0, 0];

    /// 为标签 `label` 生成一个稳定的、肉眼易区分的颜色. 背景总为黑色.
    ///
    /// 色相按黄金分割角递增, 相邻标签的颜色差异较大.
    pub fn label_rgb(label: LabelId) -> [u8; 3] {
        if label == BACKGROUND {
            return BACKGROUND_RGB;
        }
        const GOLDEN: f64 = 0.618_033_988_749_895;
        let hue = (label as f64 * GOLDEN).fract() * 6.0;
        let sector = hue.floor() as u32;
        let f = hue - hue.floor();
        // 饱和度 0.65, 亮度 0.95.
        let (v, s) = (0.95, 0.65);
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
    }
}

#[cfg(test)]
mod tests {
    use super::palette::*;

    #[test]
    fn test_background_is_black() {
        assert_eq!(label_rgb(0), BACKGROUND_RGB);
    }

    #[test]
    fn test_labels_are_visible_and_stable() {
        for label in 1..64 {
            let c = label_rgb(label);
            assert_ne!(c, BACKGROUND_RGB);
            assert_eq!(c, label_rgb(label));
        }
        assert_ne!(label_rgb(1), label_rgb(2));
    }
}
