//! 数据集路径操作.

use std::io;
use std::path::{Path, PathBuf};

/// 可以作为 2D 切片读取的图像扩展名 (小写).
const SLICE_EXTENSIONS: [&str; 6] = ["tif", "tiff", "png", "bmp", "jpg", "jpeg"];

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 判断 `path` 是否具有 2D 切片图像的扩展名.
fn is_slice_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SLICE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// 获取 `dir` 下所有 2D 切片图像文件, 按文件名升序排列.
///
/// 不递归进入子目录. 切片编号需要补零 (如 `z007.png`) 才能得到正确顺序.
pub fn sorted_slice_files<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut ans = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && is_slice_file(&path) {
            ans.push(path);
        }
    }
    ans.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_sorted_slice_files() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("cell-berry-dataset-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("nested.png")).unwrap();
        for name in ["b.PNG", "a.tif", "c.txt", "a0.png"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        let names: Vec<String> = sorted_slice_files(&dir)
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.tif", "a0.png", "b.PNG"]);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_home_dataset_dir_with() {
        if let Some(base) = home_dataset_dir() {
            let p = home_dataset_dir_with(["cells", "labels.tif"]).unwrap();
            assert_eq!(p, base.join("cells").join("labels.tif"));
        }
    }
}
