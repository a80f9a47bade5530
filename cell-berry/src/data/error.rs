//! 体数据读写错误.

use std::fmt;
use std::path::PathBuf;

/// 读取或保存体数据时的运行时错误.
#[derive(Debug)]
pub enum LoadError {
    /// 底层 I/O 错误.
    Io(std::io::Error),

    /// 2D 图像编解码错误.
    Image(image::ImageError),

    /// tiff 编解码错误.
    Tiff(tiff::TiffError),

    /// nifti 读取错误.
    Nifti(nifti::NiftiError),

    /// npy 读取错误.
    ReadNpy(ndarray_npy::ReadNpyError),

    /// npy 写入错误.
    WriteNpy(ndarray_npy::WriteNpyError),

    /// 无法从路径判断数据格式.
    UnknownFormat(PathBuf),

    /// 不支持的像素类型 (如 RGB 标签图).
    UnsupportedSample(String),

    /// 切片形状不一致. 分别为期望形状, 实际形状和出错切片序号.
    InconsistentShape {
        /// 第一张切片的 `(h, w)`.
        expected: (usize, usize),
        /// 出错切片的 `(h, w)`.
        found: (usize, usize),
        /// 出错切片在堆栈中的序号.
        plane: usize,
    },

    /// 数据维度不是 3 (或 2D 切片目录为空).
    BadDimension(usize),

    /// 标签值不是非负整数或超出 [`crate::LabelId`] 范围.
    InvalidLabel(f64),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "I/O error: {e}"),
            LoadError::Image(e) => write!(f, "image error: {e}"),
            LoadError::Tiff(e) => write!(f, "tiff error: {e}"),
            LoadError::Nifti(e) => write!(f, "nifti error: {e}"),
            LoadError::ReadNpy(e) => write!(f, "npy read error: {e}"),
            LoadError::WriteNpy(e) => write!(f, "npy write error: {e}"),
            LoadError::UnknownFormat(p) => write!(f, "unknown volume format: {}", p.display()),
            LoadError::UnsupportedSample(s) => write!(f, "unsupported sample type: {s}"),
            LoadError::InconsistentShape {
                expected,
                found,
                plane,
            } => write!(
                f,
                "plane {plane} has shape {found:?}, expected {expected:?}"
            ),
            LoadError::BadDimension(d) => write!(f, "expected a 3D volume, got {d} dimension(s)"),
            LoadError::InvalidLabel(v) => write!(f, "invalid label value `{v}`"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Image(e) => Some(e),
            LoadError::Tiff(e) => Some(e),
            LoadError::Nifti(e) => Some(e),
            LoadError::ReadNpy(e) => Some(e),
            LoadError::WriteNpy(e) => Some(e),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($variant: ident <- $err: ty),+) => {
        $(
            impl From<$err> for LoadError {
                #[inline]
                fn from(e: $err) -> Self {
                    LoadError::$variant(e)
                }
            }
        )+
    };
}

impl_from!(
    Io <- std::io::Error,
    Image <- image::ImageError,
    Tiff <- tiff::TiffError,
    Nifti <- nifti::NiftiError,
    ReadNpy <- ndarray_npy::ReadNpyError,
    WriteNpy <- ndarray_npy::WriteNpyError
);
