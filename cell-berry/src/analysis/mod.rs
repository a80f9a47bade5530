//! 强度体数据的基础分析: 最大强度投影, 强度重映射与直方图均衡化, Otsu 阈值.

mod exposure;
mod histogram;
mod projection;
mod threshold;

pub use exposure::{equalize_histogram, rescale_intensity};
pub use histogram::Histogram;
pub use projection::{max_projection, max_projection_range};
pub use threshold::{otsu_threshold, threshold_mask};
