//! 演示流程依赖的通用组件.

use cell_berry::{IntensityWindow, Spacing};

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 适合直方图均衡化之后的数据的显示窗口, 即 `[0, 1]`.
#[inline]
pub fn equalized_window() -> IntensityWindow {
    IntensityWindow::unit()
}

/// 解析形如 `z,h,w` 的体素间距, 分隔符可以是逗号或空白.
///
/// 分量个数不为 3, 或任一分量不是有限正数时返回 `None`.
pub fn parse_spacing(s: &str) -> Option<Spacing> {
    let parts: Vec<f64> = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        &[z, h, w] => Spacing::new(z, h, w),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spacing() {
        assert_eq!(
            parse_spacing("0.29,0.065,0.065").map(|s| s.as_array()),
            Some([0.29, 0.065, 0.065])
        );
        assert_eq!(
            parse_spacing(" 2 1  1 ").map(|s| s.as_array()),
            Some([2.0, 1.0, 1.0])
        );
        assert!(parse_spacing("1,1").is_none());
        assert!(parse_spacing("1,0,1").is_none());
        assert!(parse_spacing("a,b,c").is_none());
    }

    #[test]
    fn test_sep_to() {
        let mut buf = Vec::new();
        sep_to(&mut buf).unwrap();
        assert_eq!(buf.len(), SEP.len() + 1);
        assert!(cpus() >= 1);
    }
}
