//! 体数据水平切片对象的操作.

mod core;
mod save;

pub use core::{IntensitySlice, LabelSlice};

pub use save::{ImgWriteRaw, ImgWriteVis};

pub(crate) use save::save_windowed;

cfg_if::cfg_if! {
    if #[cfg(feature = "plot")] {
        mod plot;

        pub use plot::ImgDisplay;

        pub(crate) use plot::WINDOW_NAME;
    }
}
