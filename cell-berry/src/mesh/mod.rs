//! 三角网格及其几何量.
//!
//! 网格由顶点坐标和三角面片 (三个顶点下标) 组成, 创建后不可变;
//! 所有几何变换都返回新的网格.

use std::fmt;

use itertools::Itertools;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod export;
mod isosurface;

pub use isosurface::IsoSurface;

/// 三维点或向量.
pub type Vec3 = [f64; 3];

/// 三角面片, 三个顶点下标. 逆时针方向 (右手定则) 给出外法向.
pub type Face = [usize; 3];

#[inline]
fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
fn mul(a: Vec3, s: Vec3) -> Vec3 {
    [a[0] * s[0], a[1] * s[1], a[2] * s[2]]
}

/// 三角形 `abc` 的面积. 退化三角形面积为 `0`.
#[inline]
fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f64 {
    0.5 * norm(cross(sub(b, a), sub(c, a)))
}

/// 三角形 `abc` 未归一化的法向量 `(b - a) x (c - a)`.
#[inline]
pub(crate) fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    cross(sub(b, a), sub(c, a))
}

/// 创建网格错误.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// 面片引用了不存在的顶点.
    FaceOutOfRange {
        /// 面片序号.
        face: usize,
        /// 越界的顶点下标.
        index: usize,
        /// 顶点总数.
        vertices: usize,
    },

    /// 顶点坐标存在 `NaN` 或无穷. 值为顶点序号.
    NonFiniteVertex(usize),
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::FaceOutOfRange {
                face,
                index,
                vertices,
            } => write!(
                f,
                "face {face} refers to vertex {index}, but there are only {vertices} vertices"
            ),
            MeshError::NonFiniteVertex(i) => write!(f, "vertex {i} is not finite"),
        }
    }
}

impl std::error::Error for MeshError {}

/// 三角网格.
///
/// 不变量: 所有面片的顶点下标都小于顶点个数.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
}

impl Mesh {
    /// 由顶点和面片创建网格, 并检查所有下标与坐标.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Face>) -> Result<Mesh, MeshError> {
        if let Some(i) = vertices
            .iter()
            .position(|v| v.iter().any(|c| !c.is_finite()))
        {
            return Err(MeshError::NonFiniteVertex(i));
        }
        let n = vertices.len();
        for (face, tri) in faces.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i >= n) {
                return Err(MeshError::FaceOutOfRange {
                    face,
                    index,
                    vertices: n,
                });
            }
        }
        Ok(Self { vertices, faces })
    }

    /// 调用方保证下标合法.
    #[inline]
    pub(crate) fn from_raw_parts(vertices: Vec<Vec3>, faces: Vec<Face>) -> Mesh {
        debug_assert!(faces.iter().flatten().all(|&i| i < vertices.len()));
        Self { vertices, faces }
    }

    /// 顶点坐标.
    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// 三角面片.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// 网格是否不含任何面片?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// 拆分为顶点和面片.
    #[inline]
    pub fn into_raw(self) -> (Vec<Vec3>, Vec<Face>) {
        (self.vertices, self.faces)
    }

    /// 获取第 `i` 个面片的三个顶点坐标. 越界时 panic.
    #[inline]
    pub fn triangle(&self, i: usize) -> [Vec3; 3] {
        self.faces[i].map(|v| self.vertices[v])
    }

    /// 按面片顺序迭代所有三角形.
    #[inline]
    pub fn triangles(&self) -> impl ExactSizeIterator<Item = [Vec3; 3]> + '_ {
        self.faces.iter().map(|f| f.map(|v| self.vertices[v]))
    }

    /// 每个三角形的面积.
    pub fn triangle_areas(&self) -> Vec<f64> {
        self.triangles()
            .map(|[a, b, c]| triangle_area(a, b, c))
            .collect()
    }

    /// 表面积: 所有三角形面积之和.
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|[a, b, c]| triangle_area(a, b, c)).sum()
    }

    /// 以 `scale` 逐轴缩放顶点坐标, 返回新网格.
    pub fn scaled(&self, scale: Vec3) -> Mesh {
        Self {
            vertices: self.vertices.iter().map(|&v| mul(v, scale)).collect(),
            faces: self.faces.clone(),
        }
    }

    /// 等价于 `self.scaled(scale).surface_area()`, 但不创建新网格.
    pub fn surface_area_scaled(&self, scale: Vec3) -> f64 {
        self.triangles()
            .map(|[a, b, c]| triangle_area(mul(a, scale), mul(b, scale), mul(c, scale)))
            .sum()
    }

    /// 平移所有顶点, 返回新网格.
    pub fn translated(&self, offset: Vec3) -> Mesh {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| [v[0] + offset[0], v[1] + offset[1], v[2] + offset[2]])
                .collect(),
            faces: self.faces.clone(),
        }
    }

    /// 网格围成的有向体积 (散度定理). 面片朝外时为正.
    ///
    /// 只有封闭网格的结果才有几何意义.
    pub fn volume(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| dot(a, cross(b, c)))
            .sum::<f64>()
            / 6.0
    }

    /// 所有被面片引用的顶点的包围盒 `(min, max)`. 空网格返回 `None`.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.faces
            .iter()
            .flatten()
            .map(|&i| self.vertices[i])
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((
                    [lo[0].min(v[0]), lo[1].min(v[1]), lo[2].min(v[2])],
                    [hi[0].max(v[0]), hi[1].max(v[1]), hi[2].max(v[2])],
                )),
            })
    }

    /// 网格是否封闭, 即每条无向边恰好被两个面片共享. 空网格不是封闭的.
    pub fn is_closed(&self) -> bool {
        !self.faces.is_empty()
            && self
                .faces
                .iter()
                .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
                .map(|(u, v)| (u.min(v), u.max(v)))
                .counts()
                .into_values()
                .all(|n| n == 2)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 单位立方体: 8 个顶点, 12 个朝外的面片.
    pub(crate) fn unit_cube() -> Mesh {
        let vertices = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let faces = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [1, 2, 6],
            [1, 6, 5],
            [0, 4, 7],
            [0, 7, 3],
        ];
        Mesh::new(vertices, faces).unwrap()
    }

    pub(crate) fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps * b.abs().max(1.0)
    }

    #[test]
    fn test_unit_cube_area() {
        let m = unit_cube();
        assert_eq!(m.surface_area(), 6.0);
        assert!(close(m.volume(), 1.0, 1e-12));
        assert!(m.is_closed());
        assert_eq!(m.bounds(), Some(([0.0; 3], [1.0; 3])));
    }

    #[test]
    fn test_area_is_face_order_independent() {
        let m = unit_cube();
        let (v, mut f) = m.clone().into_raw();
        f.reverse();
        f.swap(0, 5);
        f.rotate_left(4);
        let shuffled = Mesh::new(v, f).unwrap();
        assert!(close(shuffled.surface_area(), m.surface_area(), 1e-12));
    }

    #[test]
    fn test_uniform_scaling_is_quadratic() {
        let m = unit_cube();
        for k in [0.5, 2.0, 3.7] {
            assert!(close(m.scaled([k; 3]).surface_area(), 6.0 * k * k, 1e-12));
            assert!(close(m.surface_area_scaled([k; 3]), 6.0 * k * k, 1e-12));
        }
        // 非均匀缩放: 面积为 2(ab + bc + ca).
        let (a, b, c) = (2.0, 3.0, 0.5);
        assert!(close(
            m.surface_area_scaled([a, b, c]),
            2.0 * (a * b + b * c + c * a),
            1e-12
        ));
        assert!(close(m.scaled([a, b, c]).volume(), a * b * c, 1e-12));
    }

    #[test]
    fn test_degenerate_triangle() {
        let m = Mesh::new(
            vec![[0.0; 3], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]],
            vec![[0, 1, 2], [0, 0, 0]],
        )
        .unwrap();
        assert_eq!(m.surface_area(), 0.0);
        assert_eq!(m.triangle_areas(), vec![0.0, 0.0]);
        assert!(!m.is_closed());
    }

    #[test]
    fn test_invalid_mesh() {
        let err = Mesh::new(vec![[0.0; 3]; 2], vec![[0, 1, 2]]).unwrap_err();
        assert_eq!(
            err,
            MeshError::FaceOutOfRange {
                face: 0,
                index: 2,
                vertices: 2
            }
        );
        let err = Mesh::new(vec![[f64::NAN, 0.0, 0.0]], vec![]).unwrap_err();
        assert_eq!(err, MeshError::NonFiniteVertex(0));
        assert!(Mesh::default().is_empty());
        assert!(!Mesh::default().is_closed());
        assert_eq!(Mesh::default().bounds(), None);
    }

    #[test]
    fn test_translated() {
        let m = unit_cube().translated([1.0, -2.0, 0.5]);
        assert_eq!(m.bounds(), Some(([1.0, -2.0, 0.5], [2.0, -1.0, 1.5])));
        assert_eq!(m.surface_area(), 6.0);
    }
}
