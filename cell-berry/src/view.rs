//! 体数据的展示: 逐层浏览, 以及最大强度投影的保存.
//!
//! [`SliceViewer`] 维护当前层序号, 并将当前层渲染为 RGB 图像:
//! 有强度数据时以灰度展示强度, 并用伪彩色勾勒各标签的轮廓;
//! 只有标签数据时直接以伪彩色填充.
//!
//! 打开 `plot` feature 后, [`browse`] 可以在窗口中用键盘逐层浏览.

use std::path::Path;

use image::{ImageResult, Rgb, RgbImage};
use ndarray::Array2;

use crate::consts::palette::{label_rgb, BACKGROUND_RGB};
use crate::consts::BACKGROUND;
use crate::{ImgWriteVis, IntensitySlice, IntensityVolume, IntensityWindow, LabelVolume, VolumeAttr};

/// 逐层浏览器.
pub struct SliceViewer<'a> {
    intensity: Option<&'a IntensityVolume>,
    window: Option<IntensityWindow>,
    labels: Option<&'a LabelVolume>,
    index: usize,
    len: usize,
}

impl<'a> SliceViewer<'a> {
    /// 浏览标签体数据. 体数据不含任何层时返回 `None`.
    pub fn labels(labels: &'a LabelVolume) -> Option<Self> {
        (labels.len_z() > 0).then_some(Self {
            intensity: None,
            window: None,
            labels: Some(labels),
            index: 0,
            len: labels.len_z(),
        })
    }

    /// 浏览强度体数据, 显示窗口默认取整个体数据的有限强度范围.
    /// 体数据不含任何层时返回 `None`.
    pub fn intensity(intensity: &'a IntensityVolume) -> Option<Self> {
        (intensity.len_z() > 0).then_some(Self {
            intensity: Some(intensity),
            window: intensity
                .min_max()
                .and_then(|(lo, hi)| IntensityWindow::from_range(lo, hi)),
            labels: None,
            index: 0,
            len: intensity.len_z(),
        })
    }

    /// 指定强度显示窗口.
    #[inline]
    pub fn with_window(mut self, window: IntensityWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// 在强度图像上叠加标签轮廓. 两者形状不一致时返回 `None`.
    pub fn with_contours(mut self, labels: &'a LabelVolume) -> Option<Self> {
        match self.intensity {
            Some(v) if v.shape() != labels.shape() => None,
            _ => {
                self.labels = Some(labels);
                Some(self)
            }
        }
    }

    /// 当前层序号.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 总层数.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// 浏览器至少包含一层, 因此总是返回 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// 跳转到第 `index` 层. 越界时停在最后一层. 返回实际层序号.
    #[inline]
    pub fn set_index(&mut self, index: usize) -> usize {
        self.index = index.min(self.len - 1);
        self.index
    }

    /// 前进 (`delta > 0`) 或后退若干层, 在两端截止. 返回实际层序号.
    #[inline]
    pub fn step(&mut self, delta: isize) -> usize {
        let target = self.index.saturating_add_signed(delta);
        self.set_index(target)
    }

    /// 将当前层渲染为 RGB 图像.
    pub fn render(&self) -> RgbImage {
        let (h, w) = match (self.intensity, self.labels) {
            (Some(v), _) => v.slice_shape(),
            (None, Some(l)) => l.slice_shape(),
            (None, None) => unreachable!(),
        };
        let mut img = RgbImage::from_pixel(w as u32, h as u32, Rgb(BACKGROUND_RGB));

        if let Some(v) = self.intensity {
            let sli = v.slice_at(self.index);
            for ((i, j), &x) in sli.indexed_iter() {
                let g = self.window.map_or(0, |win| win.eval_or_black(x));
                img.put_pixel(j as u32, i as u32, Rgb([g; 3]));
            }
        }

        if let Some(l) = self.labels {
            let sli = l.slice_at(self.index);
            let outline_only = self.intensity.is_some();
            for ((i, j), &label) in sli.indexed_iter() {
                if label == BACKGROUND {
                    continue;
                }
                if !outline_only || sli.is_contour((i, j), label) {
                    img.put_pixel(j as u32, i as u32, Rgb(label_rgb(label)));
                }
            }
        }
        img
    }

    /// 将当前层渲染结果保存到 `path`.
    #[inline]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.render().save(path)
    }
}

/// 将投影结果 (如最大强度投影) 保存为 8-bit 灰度图.
///
/// `window` 为 `None` 时使用投影自身的有限强度范围.
pub fn save_projection<P: AsRef<Path>>(
    projection: &Array2<f32>,
    window: Option<IntensityWindow>,
    path: P,
) -> ImageResult<()> {
    let sli = IntensitySlice::new(projection.view());
    match window {
        Some(w) => crate::data::slice::save_windowed(&sli, Some(w), path),
        None => sli.save(path),
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "plot")] {
        use opencv::core::{Scalar, Size, Vec3b, VecN, CV_8UC3};
        use opencv::highgui::{imshow, wait_key};
        use opencv::prelude::{Mat, MatTrait};

        /// RGB 图像转换为 OpenCV 的 BGR 矩阵.
        fn rgb_to_mat(img: &RgbImage) -> opencv::Result<Mat> {
            let (w, h) = img.dimensions();
            let mut mat =
                Mat::new_size_with_default(Size::new(w as i32, h as i32), CV_8UC3, Scalar::from(0))?;
            for (j, i, &Rgb([r, g, b])) in img.enumerate_pixels() {
                *mat.at_2d_mut::<Vec3b>(i as i32, j as i32)? = VecN([b, g, r]);
            }
            Ok(mat)
        }

        /// 在窗口中逐层浏览. `j`/`s` 下一层, `k`/`w` 上一层,
        /// `d`/`u` 前进或后退十层, `q` 或 `Esc` 退出.
        pub fn browse(viewer: &mut SliceViewer<'_>) -> opencv::Result<()> {
            const ESC: i32 = 27;
            loop {
                imshow(crate::data::slice::WINDOW_NAME, &rgb_to_mat(&viewer.render())?)?;
                let key = wait_key(0)?;
                let delta = match u8::try_from(key).map(char::from) {
                    Ok('j' | 's') => 1,
                    Ok('k' | 'w') => -1,
                    Ok('d') => 10,
                    Ok('u') => -10,
                    Ok('q') => return Ok(()),
                    _ if key == ESC || key < 0 => return Ok(()),
                    _ => 0,
                };
                let index = viewer.step(delta);
                log::debug!("showing plane {index}/{}", viewer.len());
            }
        }
    }
}
