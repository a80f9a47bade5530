//! 图片展示模块, 主要用于调试和交互式浏览.
//!
//! # 注意
//!
//! 需要 `plot` feature.

use crate::consts::palette::label_rgb;
use crate::{Idx2d, IntensitySlice, IntensityWindow, LabelSlice};
use ndarray::{Array2, ArrayView2};
use opencv::core::{Scalar, Size, CV_8UC1};
use opencv::highgui::{imshow, wait_key};
use opencv::prelude::{Mat, MatTrait, MatTraitConst};
use std::time::Duration;

/// 默认窗口名.
pub(crate) const WINDOW_NAME: &str = "cell-berry";

/// 表明一个可以在窗口中可视化的对象.
pub trait ImgDisplay {
    /// 转换为可以直接展示的 8-bit 单通道矩阵.
    fn to_mat(&self) -> opencv::Result<Mat>;

    /// 展示对象.
    fn show(&self) -> opencv::Result<()> {
        imshow(WINDOW_NAME, &self.to_mat()?)
    }

    /// 同 `show()`, 但在之后自动等待一次用户按键输入. 返回按键码.
    fn show_and_wait(&self) -> opencv::Result<i32> {
        self.show()?;
        wait_key(0)
    }

    /// 同 `show()`, 但在之后自动等待给定时间.
    fn show_and_wait_for(&self, d: Duration) -> opencv::Result<i32> {
        self.show()?;
        let ms = d.as_millis().min(i32::MAX as u128);
        wait_key(ms as i32)
    }
}

/// 以 `(h, w)` 大小创建矩阵, 并用 `pixel` 逐点填充.
fn fill_mat(
    (h, w): Idx2d,
    mut pixel: impl FnMut(usize, usize) -> u8,
) -> opencv::Result<Mat> {
    let mut mat =
        Mat::new_size_with_default(Size::new(w as i32, h as i32), CV_8UC1, Scalar::from(0))?;
    for i in 0..h {
        for j in 0..w {
            *mat.at_2d_mut::<u8>(i as i32, j as i32)? = pixel(i, j);
        }
    }
    Ok(mat)
}

/// 伪彩色的亮度, 用于单通道展示.
#[inline]
fn label_luma(label: u32) -> u8 {
    let [r, g, b] = label_rgb(label);
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

/// 强度数组转矩阵, 使用数组自身的有限值范围作为窗口.
fn intensity_to_mat(data: ArrayView2<f32>) -> opencv::Result<Mat> {
    let &[h, w] = data.shape() else {
        unreachable!()
    };
    let (lo, hi) = data
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let window = IntensityWindow::from_range(lo, hi);
    fill_mat((h, w), |i, j| {
        window.map_or(0, |win| win.eval_or_black(data[(i, j)]))
    })
}

/// 背景为黑色, 其余标签按伪彩色亮度展示.
impl ImgDisplay for LabelSlice<'_> {
    fn to_mat(&self) -> opencv::Result<Mat> {
        fill_mat(self.shape(), |i, j| label_luma(self[(i, j)]))
    }
}

/// 以切片自身的强度范围展示.
impl ImgDisplay for IntensitySlice<'_> {
    fn to_mat(&self) -> opencv::Result<Mat> {
        intensity_to_mat(self.data())
    }
}

/// 例如最大强度投影的结果.
impl ImgDisplay for Array2<f32> {
    fn to_mat(&self) -> opencv::Result<Mat> {
        intensity_to_mat(self.view())
    }
}
