use std::collections::VecDeque;

use log::debug;
use ndarray::Array3;

use super::{BinaryMask, PLANE_ROW_COL};
use crate::consts::BACKGROUND;
use crate::{LabelId, LabelVolume, VolumeAttr};

/// 按照 6-相邻规则对二值掩膜做连通分量标记.
///
/// 返回的标签体数据按 `(z, h, w)` 组织 (掩膜会先重排到该顺序),
/// 分量标签为 `1..=n`, 按每个分量首个体素的行优先顺序编号. 同时返回分量个数 `n`.
pub fn label_components(mask: &BinaryMask) -> (LabelVolume, usize) {
    let mask = if mask.order() == PLANE_ROW_COL {
        mask.clone()
    } else {
        mask.permuted(PLANE_ROW_COL)
    };
    let data = mask.data();
    let mut out = LabelVolume::from_array(Array3::zeros(mask.shape()), mask.spacing());

    let mut next: LabelId = 0;
    let mut bfs_q = VecDeque::with_capacity(16);
    for (pos, &fg) in data.indexed_iter() {
        if !fg || out[pos] != BACKGROUND {
            continue;
        }
        next += 1;
        out[pos] = next;
        bfs_q.push_back(pos);
        while let Some(cur) = bfs_q.pop_front() {
            for neigh in out.diamond_neighbours(cur) {
                if data[neigh] && out[neigh] == BACKGROUND {
                    out[neigh] = next;
                    bfs_q.push_back(neigh);
                }
            }
        }
    }
    debug!("{next} 6-connected component(s) in mask {:?}", mask.shape());
    (out, next as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Spacing;

    #[test]
    fn test_label_components() {
        let mut data = Array3::from_elem((2, 3, 3), false);
        // 分量 1: 跨越两层
        data[(0, 0, 0)] = true;
        data[(1, 0, 0)] = true;
        data[(1, 0, 1)] = true;
        // 只有对角相邻, 属于不同分量
        data[(0, 1, 2)] = true;
        data[(0, 2, 1)] = true;
        let mask = BinaryMask::from_array(data, Spacing::isotropic());

        let (labels, n) = label_components(&mask);
        assert_eq!(n, 3);
        assert_eq!(labels[(0, 0, 0)], 1);
        assert_eq!(labels[(1, 0, 1)], 1);
        assert_eq!(labels[(0, 1, 2)], 2);
        assert_eq!(labels[(0, 2, 1)], 3);
        assert_eq!(labels.count(BACKGROUND), 18 - 5);
    }

    #[test]
    fn test_components_of_reordered_mask() {
        let mut data = Array3::from_elem((2, 2, 2), false);
        data[(0, 0, 0)] = true;
        data[(1, 1, 1)] = true;
        let mask = BinaryMask::from_array(data, Spacing::isotropic()).to_row_col_plane();
        let (labels, n) = label_components(&mask);
        assert_eq!(n, 2);
        assert_eq!(labels.shape(), (2, 2, 2));
        assert_eq!(labels.labels(), vec![1, 2]);
    }

    #[test]
    fn test_empty_mask() {
        let mask = BinaryMask::from_array(Array3::from_elem((1, 2, 2), false), Spacing::isotropic());
        let (labels, n) = label_components(&mask);
        assert_eq!(n, 0);
        assert!(labels.is_background());
    }
}
