#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供标签化 3D 显微图像 (细胞分割结果) 的结构化信息、
//! 等值面网格提取与表面积计算等基础算法.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 所有体数据统一按照 `(plane, row, col)`, 即 `(z, h, w)` 的方式存储和访问.
//!   只有在提取网格前, 掩膜才会按需转换为 `(row, col, plane)`.
//! 2. 标签值 `0` 总是代表背景.
//! 3. 索引越界等调用方错误会直接 panic; 文件读取、数据格式等运行时错误以
//!   `Result` 返回.
//!
//! # 开发计划
//!
//! ### 体数据读取 ✅
//!
//! 多页 tiff, 按文件名排序的 2D 切片目录, nifti, npy.
//!
//! 实现位于 `cell-berry/src/data/io.rs`.
//!
//! ### 区域描述与掩膜提取 ✅
//!
//! 单次遍历获得所有标签的包围盒、体素数与质心;
//! 按标签提取裁剪后的二值掩膜, 并支持 6-连通分量重新标记.
//!
//! 实现位于 `cell-berry/src/region`.
//!
//! ### 等值面提取 ✅
//!
//! 逐立方体推进, 按 256 种角点内外组合查表得到等值多边形, 多边形以重心扇形剖分.
//! 网格顶点在相邻立方体之间共享, 因此封闭区域得到封闭网格; 表面积与轴的镜像和置换无关.
//!
//! 实现位于 `cell-berry/src/mesh/isosurface.rs`.
//!
//! ### 表面积与体素各向异性 ✅
//!
//! 三角形面积求和; 体素间距以参考轴归一化后作用于顶点坐标.
//!
//! 实现位于 `cell-berry/src/mesh` 和 `cell-berry/src/data/spacing.rs`.
//!
//! ### 最大强度投影, 直方图均衡化, Otsu 阈值 ✅
//!
//! 实现位于 `cell-berry/src/analysis`.
//!
//! ### 切片浏览 ✅
//!
//! 切片保存为图片; 打开 `plot` feature 后可在窗口中逐层浏览.
//!
//! 实现位于 `cell-berry/src/view.rs`.

/// 二维索引 `(h, w)`.
pub type Idx2d = (usize, usize);

/// 三维索引 `(z, h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 标签值类型.
pub type LabelId = u32;

/// 3D 体数据基础数据结构.
mod data;

pub use data::{
    Axis3, ImgWriteRaw, ImgWriteVis, IntensitySlice, IntensityVolume, IntensityWindow,
    LabelSlice, LabelVolume, LoadError, Spacing, VolumeAttr,
};

pub use data::io;

#[cfg(feature = "plot")]
pub use data::ImgDisplay;

pub mod consts;

pub mod region;

pub mod mesh;

pub mod analysis;

pub mod pipeline;

pub mod view;

pub mod dataset;
pub mod prelude;
