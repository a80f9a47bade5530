//! 对 `cell-berry::io` 的更一层封装. 路径与参数优先取自环境变量.

use cell_berry::{IntensityVolume, LabelId, LabelVolume, LoadError, Spacing};
use std::env;
use std::path::PathBuf;

/// 获取标签体数据路径.
///
/// 1. 若环境变量 `$CELL_LABELS` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cells/labels.tif`.
pub fn labels_path_from_env_or_home() -> PathBuf {
    match env::var("CELL_LABELS") {
        Ok(d) if !d.is_empty() => PathBuf::from(d),
        _ => cell_berry::dataset::home_dataset_dir_with(["cells", "labels.tif"])
            .expect("cannot locate home directory"),
    }
}

/// 获取输出目录.
///
/// 1. 若环境变量 `$CELL_OUTPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cells/out`.
pub fn output_dir_from_env_or_home() -> PathBuf {
    match env::var("CELL_OUTPUT_DIR") {
        Ok(d) if !d.is_empty() => PathBuf::from(d),
        _ => cell_berry::dataset::home_dataset_dir_with(["cells", "out"])
            .expect("cannot locate home directory"),
    }
}

/// 从 `$CELL_SPACING` (形如 `z,h,w`) 读取体素间距. 未设置时返回 `None`.
///
/// 环境变量存在但无法解析时程序 panic.
pub fn spacing_from_env() -> Option<Spacing> {
    let s = env::var("CELL_SPACING").ok().filter(|s| !s.is_empty())?;
    Some(crate::parse_spacing(&s).unwrap_or_else(|| panic!("invalid $CELL_SPACING `{s}`")))
}

/// 从 `$CELL_LABEL` 读取要测量的标签. 未设置时返回 `None`, 表示测量全部细胞.
///
/// 环境变量存在但无法解析时程序 panic.
pub fn label_from_env() -> Option<LabelId> {
    let s = env::var("CELL_LABEL").ok().filter(|s| !s.is_empty())?;
    Some(
        s.trim()
            .parse()
            .unwrap_or_else(|_| panic!("invalid $CELL_LABEL `{s}`")),
    )
}

/// 从 `$CELL_LABELS` 或者 `$HOME/dataset/cells/labels.tif` 加载标签体数据,
/// 并以 `$CELL_SPACING` (若存在) 覆盖体素间距.
pub fn labels_from_env_or_home() -> Result<LabelVolume, LoadError> {
    let volume = LabelVolume::open(labels_path_from_env_or_home())?;
    Ok(match spacing_from_env() {
        Some(s) => volume.with_spacing(s),
        None => volume,
    })
}

/// 若设置了 `$CELL_INTENSITY`, 则加载对应的强度体数据, 体素间距处理同
/// [`labels_from_env_or_home`].
pub fn intensity_from_env() -> Option<Result<IntensityVolume, LoadError>> {
    let p = env::var("CELL_INTENSITY").ok().filter(|s| !s.is_empty())?;
    Some(IntensityVolume::open(p).map(|v| match spacing_from_env() {
        Some(s) => v.with_spacing(s),
        None => v,
    }))
}
