//! 体数据的读取与保存.
//!
//! 支持以下来源, 由 [`open_labels`] 和 [`open_intensity`] 按路径自动识别:
//!
//! 1. 多页 tiff (`.tif`, `.tiff`): 每一页是一个水平切片;
//! 2. 目录: 目录下的 2D 图像按文件名升序堆叠为水平切片;
//! 3. nifti (`.nii`, `.nii.gz`): 体素间距取自 header;
//! 4. npy (`.npy`): 按 `(z, h, w)` 组织的三维数组.
//!
//! 除 nifti 外, 其它格式不携带体素间距, 读取后为各向同性间距,
//! 可以再通过 `with_spacing` 指定.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use either::Either;
use image::DynamicImage;
use log::{debug, info, warn};
use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};

use super::{IntensityVolume, LabelVolume, LoadError, Spacing, VolumeAttr};
use crate::{Idx2d, LabelId};

/// 单文件体数据格式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VolumeFormat {
    /// 多页 tiff.
    Tiff,

    /// nifti-1.
    Nifti,

    /// numpy 数组.
    Npy,
}

impl VolumeFormat {
    /// 由文件扩展名判断格式. 无法判断时返回 `None`.
    pub fn from_path(path: &Path) -> Option<VolumeFormat> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tif") || name.ends_with(".tiff") {
            Some(VolumeFormat::Tiff)
        } else if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            Some(VolumeFormat::Nifti)
        } else if name.ends_with(".npy") {
            Some(VolumeFormat::Npy)
        } else {
            None
        }
    }
}

/// 判断 `path` 是单文件体数据, 还是 2D 切片目录 (此时给出排好序的切片文件).
fn classify(path: &Path) -> Result<Either<VolumeFormat, Vec<PathBuf>>, LoadError> {
    if path.is_dir() {
        let files = crate::dataset::sorted_slice_files(path)?;
        if files.is_empty() {
            return Err(LoadError::BadDimension(0));
        }
        return Ok(Either::Right(files));
    }
    VolumeFormat::from_path(path)
        .map(Either::Left)
        .ok_or_else(|| LoadError::UnknownFormat(path.to_owned()))
}

/// 读取原始体数据 (统一转为 `f64`) 及其可能携带的体素间距.
fn read_raw(path: &Path, gray_only: bool) -> Result<(Array3<f64>, Option<Spacing>), LoadError> {
    let ans = match classify(path)? {
        Either::Left(VolumeFormat::Tiff) => (read_tiff_stack(path)?, None),
        Either::Left(VolumeFormat::Nifti) => {
            let (data, spacing) = read_nifti(path)?;
            (data, Some(spacing))
        }
        Either::Left(VolumeFormat::Npy) => (read_npy_any(path)?, None),
        Either::Right(files) => (read_slice_files(&files, gray_only)?, None),
    };
    info!(
        "loaded volume {:?} from {}",
        ans.0.shape(),
        path.display()
    );
    Ok(ans)
}

/// 将 `f64` 转换为标签值. 必须是 [`LabelId`] 范围内的非负整数.
#[inline]
fn to_label(v: f64) -> Result<LabelId, LoadError> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= LabelId::MAX as f64 {
        Ok(v as LabelId)
    } else {
        Err(LoadError::InvalidLabel(v))
    }
}

/// 打开标签体数据. 格式由路径自动识别, 见模块文档.
///
/// 标签图像必须是单通道整数 (或者取整数值的浮点数), 否则返回错误.
pub fn open_labels<P: AsRef<Path>>(path: P) -> Result<LabelVolume, LoadError> {
    let (raw, spacing) = read_raw(path.as_ref(), true)?;
    let mut data = Array3::<LabelId>::zeros(raw.raw_dim());
    for (dst, &src) in data.iter_mut().zip(raw.iter()) {
        *dst = to_label(src)?;
    }
    Ok(LabelVolume::from_array(data, spacing.unwrap_or_default()))
}

/// 打开强度体数据. 格式由路径自动识别, 见模块文档.
///
/// 彩色 2D 切片会先转换为相同位深的亮度, 例如 8-bit RGB 得到 `[0, 255]` 的值.
pub fn open_intensity<P: AsRef<Path>>(path: P) -> Result<IntensityVolume, LoadError> {
    let (raw, spacing) = read_raw(path.as_ref(), false)?;
    Ok(IntensityVolume::from_array(
        raw.mapv(|v| v as f32),
        spacing.unwrap_or_default(),
    ))
}

/// 把 tiff 解码结果统一转换为 `f64`.
fn decoded_to_f64(res: DecodingResult) -> Result<Vec<f64>, LoadError> {
    macro_rules! widen {
        ($v: expr) => {
            $v.into_iter().map(|x| x as f64).collect()
        };
    }
    #[allow(unreachable_patterns)]
    let ans = match res {
        DecodingResult::U8(v) => widen!(v),
        DecodingResult::U16(v) => widen!(v),
        DecodingResult::U32(v) => widen!(v),
        DecodingResult::U64(v) => widen!(v),
        DecodingResult::I8(v) => widen!(v),
        DecodingResult::I16(v) => widen!(v),
        DecodingResult::I32(v) => widen!(v),
        DecodingResult::I64(v) => widen!(v),
        DecodingResult::F32(v) => widen!(v),
        DecodingResult::F64(v) => v,
        _ => return Err(LoadError::UnsupportedSample("tiff sample".to_string())),
    };
    Ok(ans)
}

/// 读取多页 tiff. 每一页必须是相同大小的单通道图像.
fn read_tiff_stack(path: &Path) -> Result<Array3<f64>, LoadError> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let mut shape: Option<Idx2d> = None;
    let mut buf = Vec::new();
    let mut planes = 0usize;

    loop {
        let (w, h) = decoder.dimensions()?;
        let (h, w) = (h as usize, w as usize);
        let samples = decoded_to_f64(decoder.read_image()?)?;
        if samples.len() != h * w {
            return Err(LoadError::UnsupportedSample(format!(
                "{} samples per pixel",
                samples.len() / (h * w).max(1)
            )));
        }
        match shape {
            None => shape = Some((h, w)),
            Some(expected) if expected != (h, w) => {
                return Err(LoadError::InconsistentShape {
                    expected,
                    found: (h, w),
                    plane: planes,
                })
            }
            Some(_) => {}
        }
        buf.extend(samples);
        planes += 1;

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    let (h, w) = shape.unwrap_or((0, 0));
    debug!("tiff stack: {planes} page(s) of {h}x{w}");
    Array3::from_shape_vec((planes, h, w), buf).map_err(|_| LoadError::BadDimension(3))
}

/// 读取单张 2D 图像为行优先序列. `gray_only` 为 `true` 时拒绝彩色图像.
fn read_plane(path: &Path, gray_only: bool) -> Result<(Idx2d, Vec<f64>), LoadError> {
    let img = image::open(path)?;
    let shape = (img.height() as usize, img.width() as usize);
    let samples = match img {
        DynamicImage::ImageLuma8(b) => b.into_raw().into_iter().map(f64::from).collect(),
        DynamicImage::ImageLuma16(b) => b.into_raw().into_iter().map(f64::from).collect(),
        other if gray_only => {
            return Err(LoadError::UnsupportedSample(format!(
                "{:?} in {}",
                other.color(),
                path.display()
            )))
        }
        // 亮度保持原有位深, 与灰度图像的取值范围一致.
        other => {
            let color = other.color();
            match color.bytes_per_pixel() / color.channel_count() {
                1 => other.to_luma8().into_raw().into_iter().map(f64::from).collect(),
                2 => other.to_luma16().into_raw().into_iter().map(f64::from).collect(),
                _ => other.to_luma32f().into_raw().into_iter().map(f64::from).collect(),
            }
        }
    };
    Ok((shape, samples))
}

/// 将排好序的 2D 图像文件堆叠为体数据.
fn read_slice_files(files: &[PathBuf], gray_only: bool) -> Result<Array3<f64>, LoadError> {
    let mut shape: Option<Idx2d> = None;
    let mut buf = Vec::new();
    for (plane, file) in files.iter().enumerate() {
        let (sh, samples) = read_plane(file, gray_only)?;
        match shape {
            None => shape = Some(sh),
            Some(expected) if expected != sh => {
                return Err(LoadError::InconsistentShape {
                    expected,
                    found: sh,
                    plane,
                })
            }
            Some(_) => {}
        }
        buf.extend(samples);
    }
    let (h, w) = shape.unwrap_or((0, 0));
    Array3::from_shape_vec((files.len(), h, w), buf).map_err(|_| LoadError::BadDimension(3))
}

/// 读取 nifti 文件, 并将 `[W, H, z]` 转换为 `[z, H, W]`.
fn read_nifti(path: &Path) -> Result<(Array3<f64>, Spacing), LoadError> {
    let obj = ReaderOptions::new().read_file(path)?;
    let [_, pw, ph, pz, ..] = obj.header().pixdim;
    let spacing = Spacing::new(pz as f64, ph as f64, pw as f64).unwrap_or_else(|| {
        warn!("invalid pixdim in {}, assuming isotropic spacing", path.display());
        Spacing::isotropic()
    });

    let mut data: ArrayD<f64> = obj.into_volume().into_ndarray::<f64>()?;
    // 允许形如 [W, H, z, 1] 的单帧 4D 数据.
    while data.ndim() > 3 && data.shape()[data.ndim() - 1] == 1 {
        let last = data.ndim() - 1;
        data = data.index_axis_move(Axis(last), 0);
    }
    let ndim = data.ndim();
    let data = data
        .into_dimensionality::<Ix3>()
        .map_err(|_| LoadError::BadDimension(ndim))?;

    // hint: 原第一维向右增长, 原第二维向下增长.
    let data = data.permuted_axes([2, 1, 0]).as_standard_layout().into_owned();
    Ok((data, spacing))
}

/// 读取 npy 文件. 依次尝试常见的元素类型; 维度不是 3 时返回 [`LoadError::BadDimension`].
fn read_npy_any(path: &Path) -> Result<Array3<f64>, LoadError> {
    macro_rules! try_read {
        ($($t: ty),+) => {{
            let mut last_err = None;
            $(
                match ndarray_npy::read_npy::<_, ArrayD<$t>>(path) {
                    Ok(arr) => return into_volume(arr.mapv(|x| x as f64)),
                    Err(e) => last_err = Some(e),
                }
            )+
            last_err
        }};
    }
    fn into_volume(arr: ArrayD<f64>) -> Result<Array3<f64>, LoadError> {
        let ndim = arr.ndim();
        arr.into_dimensionality::<Ix3>()
            .map_err(|_| LoadError::BadDimension(ndim))
    }

    match try_read!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64) {
        Some(e) => Err(LoadError::ReadNpy(e)),
        None => unreachable!(),
    }
}

/// 将标签体数据保存为多页 32-bit 灰度 tiff. 每个水平切片一页.
pub fn save_labels_tiff<P: AsRef<Path>>(volume: &LabelVolume, path: P) -> Result<(), LoadError> {
    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path.as_ref())?))?;
    let (h, w) = volume.slice_shape();
    for sli in volume.slice_iter() {
        let plane = sli.as_row_major_slice();
        encoder.write_image::<colortype::Gray32>(w as u32, h as u32, plane.as_ref())?;
    }
    info!("saved {} page(s) to {}", volume.len_z(), path.as_ref().display());
    Ok(())
}

/// 将强度体数据保存为多页 32-bit 浮点 tiff. 每个水平切片一页.
pub fn save_intensity_tiff<P: AsRef<Path>>(
    volume: &IntensityVolume,
    path: P,
) -> Result<(), LoadError> {
    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path.as_ref())?))?;
    let (h, w) = volume.slice_shape();
    for sli in volume.slice_iter() {
        let plane: Vec<f32> = sli.iter().copied().collect();
        encoder.write_image::<colortype::Gray32Float>(w as u32, h as u32, &plane)?;
    }
    info!("saved {} page(s) to {}", volume.len_z(), path.as_ref().display());
    Ok(())
}

/// 将标签体数据按 `(z, h, w)` 保存为 npy.
pub fn save_labels_npy<P: AsRef<Path>>(volume: &LabelVolume, path: P) -> Result<(), LoadError> {
    ndarray_npy::write_npy(path.as_ref(), &volume.data())?;
    Ok(())
}

impl LabelVolume {
    /// 打开标签体数据, 等价于 [`open_labels`].
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        open_labels(path)
    }
}

impl IntensityVolume {
    /// 打开强度体数据, 等价于 [`open_intensity`].
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        open_intensity(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImgWriteRaw;
    use std::fs;

    /// 在系统临时目录下创建一个本测试专用的目录.
    fn scratch_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("cell-berry-io-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&p);
        fs::create_dir_all(&p).unwrap();
        p
    }

    fn toy_labels() -> LabelVolume {
        let mut data = Array3::<LabelId>::zeros((3, 4, 5));
        data[(0, 1, 1)] = 1;
        data[(1, 2, 3)] = 70_000;
        data[(2, 3, 4)] = 2;
        LabelVolume::from_array(data, Spacing::isotropic())
    }

    #[test]
    fn test_format_from_path() {
        let f = |s: &str| VolumeFormat::from_path(Path::new(s));
        assert_eq!(f("a/cells.TIF"), Some(VolumeFormat::Tiff));
        assert_eq!(f("cells.tiff"), Some(VolumeFormat::Tiff));
        assert_eq!(f("x.nii.gz"), Some(VolumeFormat::Nifti));
        assert_eq!(f("x.nii"), Some(VolumeFormat::Nifti));
        assert_eq!(f("x.npy"), Some(VolumeFormat::Npy));
        assert_eq!(f("x.png"), None);
    }

    #[test]
    fn test_tiff_stack_labels() {
        let dir = scratch_dir("tiff");
        let path = dir.join("labels.tif");
        let v = toy_labels();
        save_labels_tiff(&v, &path).unwrap();

        let back = open_labels(&path).unwrap();
        assert_eq!(back.shape(), (3, 4, 5));
        assert_eq!(back.data(), v.data());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_npy_labels() {
        let dir = scratch_dir("npy");
        let path = dir.join("labels.npy");
        let v = toy_labels();
        save_labels_npy(&v, &path).unwrap();
        let back = LabelVolume::open(&path).unwrap();
        assert_eq!(back.data(), v.data());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_slice_directory() {
        let dir = scratch_dir("slices");
        let mut data = Array3::<LabelId>::zeros((2, 3, 3));
        data[(0, 0, 0)] = 4;
        data[(1, 2, 2)] = 300;
        let v = LabelVolume::from_array(data, Spacing::isotropic());
        for (z, sli) in v.slice_iter().enumerate() {
            sli.save_raw(dir.join(format!("z{z:03}.png"))).unwrap();
        }
        let back = open_labels(&dir).unwrap();
        assert_eq!(back.data(), v.data());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_unknown_format() {
        let err = open_labels("definitely-not-a-volume.xyz").unwrap_err();
        assert!(matches!(err, LoadError::UnknownFormat(_)));
    }

    #[test]
    fn test_invalid_label_values() {
        assert!(to_label(3.0).is_ok());
        assert!(matches!(to_label(-1.0), Err(LoadError::InvalidLabel(_))));
        assert!(matches!(to_label(0.5), Err(LoadError::InvalidLabel(_))));
        assert!(matches!(to_label(f64::NAN), Err(LoadError::InvalidLabel(_))));
    }

    #[test]
    fn test_npy_must_be_3d() {
        let dir = scratch_dir("npy-dim");
        let flat = dir.join("flat.npy");
        ndarray_npy::write_npy(&flat, &ndarray::Array2::<u16>::zeros((4, 5))).unwrap();
        assert!(matches!(open_labels(&flat), Err(LoadError::BadDimension(2))));

        let stack = dir.join("stack.npy");
        ndarray_npy::write_npy(&stack, &ndarray::Array4::<f32>::zeros((2, 2, 3, 3))).unwrap();
        assert!(matches!(open_intensity(&stack), Err(LoadError::BadDimension(4))));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_nifti_axes_and_spacing() {
        let dir = scratch_dir("nifti");
        let path = dir.join("cells.nii");
        // nifti 按 [W, H, z] 存储.
        let raw = Array3::from_shape_fn((5, 4, 3), |(w, h, z)| (w + 10 * h + 100 * z) as f32);
        let header = nifti::NiftiHeader {
            pixdim: [1.0, 0.5, 0.25, 2.0, 1.0, 1.0, 1.0, 1.0],
            ..Default::default()
        };
        nifti::writer::WriterOptions::new(&path)
            .reference_header(&header)
            .write_nifti(&raw)
            .unwrap();

        let back = open_intensity(&path).unwrap();
        assert_eq!(back.shape(), (3, 4, 5));
        assert_eq!(back.spacing(), Spacing::new(2.0, 0.25, 0.5).unwrap());
        for ((z, h, w), &v) in back.data().indexed_iter() {
            assert_eq!(v, (w + 10 * h + 100 * z) as f32);
        }

        let labels = open_labels(&path).unwrap();
        assert_eq!(labels[(2, 3, 4)], 434);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_color_slices_keep_bit_depth() {
        let dir = scratch_dir("color");
        image::GrayImage::from_pixel(3, 2, image::Luma([200]))
            .save(dir.join("z000.png"))
            .unwrap();
        image::RgbImage::from_pixel(3, 2, image::Rgb([200, 200, 200]))
            .save(dir.join("z001.png"))
            .unwrap();

        let v = open_intensity(&dir).unwrap();
        assert_eq!(v.shape(), (2, 2, 3));
        assert!(v.data().iter().all(|&x| x == 200.0), "{:?}", v.data());

        // 标签不接受彩色图像.
        assert!(matches!(open_labels(&dir), Err(LoadError::UnsupportedSample(_))));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_intensity_tiff() {
        let dir = scratch_dir("intensity");
        let path = dir.join("raw.tiff");
        let mut data = Array3::<f32>::zeros((2, 2, 3));
        data[(1, 1, 2)] = 0.25;
        data[(0, 0, 1)] = 1024.5;
        let v = IntensityVolume::from_array(data, Spacing::isotropic());
        save_intensity_tiff(&v, &path).unwrap();
        let back = open_intensity(&path).unwrap();
        assert_eq!(back.data(), v.data());
        fs::remove_dir_all(dir).unwrap();
    }
}
