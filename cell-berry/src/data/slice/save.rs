//! 切片图像的持久化存储.

use crate::consts::palette::label_rgb;
use crate::{IntensitySlice, IntensityWindow, LabelSlice};
use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageError, ImageResult};
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好"
/// 的方式保存, 而不是 "as is" 的方式. 这意味着, 对于 `LabelSlice`,
/// 每个标签会映射到肉眼较易区分的伪彩色; 对于 `IntensitySlice`,
/// 在保存时会用该切片自身的强度范围规范化.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
///
/// 标签切片会按原样存为 16-bit 灰度图, 以便之后重新读取.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 构造参数错误.
fn parameter_error(msg: String) -> ImageError {
    ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::Generic(
        msg,
    )))
}

/// 背景为黑色, 其余标签映射为稳定的伪彩色.
impl ImgWriteVis for LabelSlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::RgbImage::new(width as u32, height as u32);
        for ((h, w), &label) in self.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Rgb(label_rgb(label)));
        }
        buf.save(path)
    }
}

/// 按原样存储为 16-bit 灰度图. 标签超出 `u16` 范围时返回错误.
impl ImgWriteRaw for LabelSlice<'_> {
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf =
            image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::new(width as u32, height as u32);
        for ((h, w), &label) in self.indexed_iter() {
            let pix = u16::try_from(label)
                .map_err(|_| parameter_error(format!("label `{label}` does not fit in 16 bits")))?;
            buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
        }
        buf.save(path)
    }
}

/// 以切片自身的有限强度范围作为显示窗口. 常数切片存为全黑.
impl ImgWriteVis for IntensitySlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let range = self
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f32, f32)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });
        let window = range.and_then(|(lo, hi)| IntensityWindow::from_range(lo, hi));
        save_windowed(self, window, path)
    }
}

/// 以给定窗口将强度切片保存为 8-bit 灰度图. `window` 为 `None` 时存为全黑.
pub(crate) fn save_windowed<P: AsRef<Path>>(
    slice: &IntensitySlice<'_>,
    window: Option<IntensityWindow>,
    path: P,
) -> ImageResult<()> {
    let (height, width) = slice.shape();
    let mut buf = image::GrayImage::new(width as u32, height as u32);
    if let Some(window) = window {
        for ((h, w), &v) in slice.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, image::Luma([window.eval_or_black(v)]));
        }
    }
    buf.save(path)
}
