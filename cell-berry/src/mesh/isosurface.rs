//! 标量场的等值面提取 (marching cubes).
//!
//! 逐立方体推进: 由 8 个角点的内外状态得到 256 种情形之一, 查表得到该立方体中的
//! 等值多边形, 多边形顶点由穿越等值的棱线性插值得到.
//!
//! 查表由立方体每个面上的等值线段拼接而成, 只在首次使用时构建一次. 面上对角二义性
//! 统一按 "内部角点彼此分离" 处理, 相邻立方体在公共面上的判断一致,
//! 而且规则与轴的置换和镜像无关.
//!
//! 三角形直接输出; 更多顶点的多边形以顶点重心为中心扇形剖分, 剖分方式与多边形的
//! 起点无关. 网格顶点以格点棱为键缓存, 相邻立方体共享同一个顶点.
//! 于是, 只要前景不触及场的边界, 得到的网格总是封闭的.

use std::collections::HashMap;

use log::debug;
use ndarray::ArrayView3;
use once_cell::sync::Lazy;

use super::{cross, dot, sub, Face, Mesh, Vec3};
use crate::consts::DEFAULT_ISO_LEVEL;
use crate::Idx3d;

/// 立方体的 12 条棱. 角点 `k` 的三个比特依次是三个轴上的偏移.
const EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [2, 3],
    [4, 5],
    [6, 7],
    [0, 2],
    [1, 3],
    [4, 6],
    [5, 7],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// 一种内外组合下的所有等值多边形. 每个多边形是一串棱编号,
/// 按右手定则给出从内部指向外部的法向.
type CaseLoops = Vec<Vec<usize>>;

/// 256 种情形的多边形表, 下标的第 `k` 个比特表示角点 `k` 是否在内部.
static CASES: Lazy<Vec<CaseLoops>> = Lazy::new(|| (0..256).map(case_loops).collect());

#[inline]
fn corner_pos(c: usize) -> Vec3 {
    [(c & 1) as f64, (c >> 1 & 1) as f64, (c >> 2 & 1) as f64]
}

#[inline]
fn edge_midpoint(e: usize) -> Vec3 {
    let [a, b] = EDGES[e].map(corner_pos);
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0, (a[2] + b[2]) / 2.0]
}

/// 连接相邻角点 `a`, `b` 的棱, 与 [`EDGES`] 的顺序一致.
fn edge_between(a: usize, b: usize) -> usize {
    let lo = a.min(b);
    match a ^ b {
        1 => lo >> 1,
        2 => 4 + (lo & 1 | lo >> 2 << 1),
        _ => 8 + lo,
    }
}

/// 构建情形 `case` 的多边形.
///
/// 先在 6 个面上各自连出有向等值线段 (每条线段的起点棱指向终点棱),
/// 再把线段首尾相接成环.
fn case_loops(case: usize) -> CaseLoops {
    let inside = |c: usize| case >> c & 1 == 1;
    let mut next: [Option<usize>; 12] = [None; 12];

    for axis in 0..3 {
        let (u, v) = match axis {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        for side in 0..2 {
            let ring = [(0, 0), (1, 0), (1, 1), (0, 1)].map(|(a, b)| side << axis | a << u | b << v);
            let ring_edges: [usize; 4] =
                std::array::from_fn(|i| edge_between(ring[i], ring[(i + 1) % 4]));
            let crossing: Vec<usize> = (0..4)
                .filter(|&i| inside(ring[i]) != inside(ring[(i + 1) % 4]))
                .collect();
            let segments: Vec<(usize, usize)> = match crossing.as_slice() {
                &[i, j] => vec![(i, j)],
                // 对角二义性: 每个内部角点单独截出.
                &[_, _, _, _] => (0..4)
                    .filter(|&i| inside(ring[(i + 1) % 4]))
                    .map(|i| (i, (i + 1) % 4))
                    .collect(),
                _ => vec![],
            };

            let mut normal = [0.0; 3];
            normal[axis] = if side == 0 { -1.0 } else { 1.0 };
            for (i, j) in segments {
                let (ea, eb) = (ring_edges[i], ring_edges[j]);
                let (pa, pb) = (edge_midpoint(ea), edge_midpoint(eb));
                let [p, q] = EDGES[ea];
                let p_in = corner_pos(if inside(p) { p } else { q });
                // 从面外看去, 内部角点位于线段右侧.
                if dot(cross(sub(pb, pa), sub(p_in, pa)), normal) < 0.0 {
                    next[ea] = Some(eb);
                } else {
                    next[eb] = Some(ea);
                }
            }
        }
    }

    let mut loops = Vec::new();
    let mut seen = [false; 12];
    for start in 0..12 {
        if seen[start] || next[start].is_none() {
            continue;
        }
        let mut ring = Vec::with_capacity(6);
        let mut e = start;
        while !seen[e] {
            seen[e] = true;
            ring.push(e);
            match next[e] {
                Some(n) => e = n,
                None => break,
            }
        }
        loops.push(ring);
    }
    loops
}

/// 立方体的一个角点.
#[derive(Copy, Clone)]
struct Corner {
    pos: Idx3d,
    id: usize,
    value: f32,
}

/// 等值面提取器.
///
/// 严格大于 `level` 的格点视为内部 (`NaN` 视为外部). 三角形的法向 (右手定则)
/// 从内部指向外部. 顶点坐标为 `origin + index * spacing`, 轴顺序与输入场一致.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsoSurface {
    level: f32,
    spacing: Vec3,
    origin: Vec3,
}

impl Default for IsoSurface {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_ISO_LEVEL, [1.0; 3])
    }
}

impl IsoSurface {
    /// 以等值 `level` 和按场轴顺序排列的格点间距 `spacing` 创建提取器.
    ///
    /// `level` 必须有限, `spacing` 必须都是有限正数, 否则程序 panic.
    pub fn new(level: f32, spacing: Vec3) -> Self {
        assert!(level.is_finite(), "iso level must be finite");
        assert!(
            spacing.iter().all(|s| s.is_finite() && *s > 0.0),
            "spacing must be finite and positive"
        );
        Self {
            level,
            spacing,
            origin: [0.0; 3],
        }
    }

    /// 指定格点 `(0, 0, 0)` 的坐标.
    #[inline]
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    /// 等值.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 格点间距.
    #[inline]
    pub fn spacing(&self) -> Vec3 {
        self.spacing
    }

    /// 格点坐标转换为网格坐标.
    #[inline]
    fn world(&self, (a, b, c): Idx3d) -> Vec3 {
        [
            self.origin[0] + a as f64 * self.spacing[0],
            self.origin[1] + b as f64 * self.spacing[1],
            self.origin[2] + c as f64 * self.spacing[2],
        ]
    }

    /// 提取 `field` 的等值面. 任一方向格点少于两个时返回空网格.
    pub fn extract(&self, field: ArrayView3<'_, f32>) -> Mesh {
        let (n0, n1, n2) = field.dim();
        if n0 < 2 || n1 < 2 || n2 < 2 {
            return Mesh::default();
        }

        let mut b = Builder::new(self);
        let id = |(x, y, z): Idx3d| (x * n1 + y) * n2 + z;
        for i in 0..n0 - 1 {
            for j in 0..n1 - 1 {
                for k in 0..n2 - 1 {
                    let corners: [Corner; 8] = std::array::from_fn(|c| {
                        let pos = (i + (c & 1), j + (c >> 1 & 1), k + (c >> 2 & 1));
                        Corner {
                            pos,
                            id: id(pos),
                            value: field[pos],
                        }
                    });
                    let case = (0..8)
                        .filter(|&c| b.inside(&corners[c]))
                        .fold(0, |acc, c| acc | 1 << c);
                    if case == 0 || case == 255 {
                        continue;
                    }
                    for ring in &CASES[case] {
                        b.polygon(&corners, ring);
                    }
                }
            }
        }

        let mesh = b.finish();
        debug!(
            "iso-surface at {}: {} vertices, {} faces from field {:?}",
            self.level,
            mesh.vertices().len(),
            mesh.faces().len(),
            (n0, n1, n2)
        );
        mesh
    }
}

/// 提取过程中维护的网格和棱顶点缓存.
struct Builder<'a> {
    iso: &'a IsoSurface,
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    /// `(较小格点编号, 较大格点编号)` -> 顶点下标.
    edges: HashMap<(usize, usize), usize>,
}

impl<'a> Builder<'a> {
    fn new(iso: &'a IsoSurface) -> Self {
        Self {
            iso,
            vertices: Vec::with_capacity(64),
            faces: Vec::with_capacity(128),
            edges: HashMap::with_capacity(64),
        }
    }

    #[inline]
    fn inside(&self, c: &Corner) -> bool {
        c.value > self.iso.level
    }

    /// 获取棱 `(inner, outer)` 上的等值点, 不存在时创建.
    fn crossing(&mut self, inner: Corner, outer: Corner) -> usize {
        let key = (inner.id.min(outer.id), inner.id.max(outer.id));
        if let Some(&v) = self.edges.get(&key) {
            return v;
        }
        let level = self.iso.level;
        let t = (level - inner.value) / (outer.value - inner.value);
        let t = if t.is_finite() { t.clamp(0.0, 1.0) as f64 } else { 0.5 };
        let p = self.iso.world(inner.pos);
        let q = self.iso.world(outer.pos);
        let v = [
            p[0] + t * (q[0] - p[0]),
            p[1] + t * (q[1] - p[1]),
            p[2] + t * (q[2] - p[2]),
        ];
        let idx = self.vertices.len();
        self.vertices.push(v);
        self.edges.insert(key, idx);
        idx
    }

    /// 输出由棱编号 `ring` 给出的一个等值多边形.
    fn polygon(&mut self, corners: &[Corner; 8], ring: &[usize]) {
        let ids: Vec<usize> = ring
            .iter()
            .map(|&e| {
                let [p, q] = EDGES[e].map(|c| corners[c]);
                if self.inside(&p) {
                    self.crossing(p, q)
                } else {
                    self.crossing(q, p)
                }
            })
            .collect();

        if let &[a, b, c] = ids.as_slice() {
            self.faces.push([a, b, c]);
            return;
        }
        let n = ids.len() as f64;
        let center = ids.iter().fold([0.0; 3], |acc, &v| {
            let p = self.vertices[v];
            [acc[0] + p[0], acc[1] + p[1], acc[2] + p[2]]
        });
        let center = center.map(|s| s / n);
        let c = self.vertices.len();
        self.vertices.push(center);
        for (i, &v) in ids.iter().enumerate() {
            self.faces.push([c, v, ids[(i + 1) % ids.len()]]);
        }
    }

    fn finish(self) -> Mesh {
        Mesh::from_raw_parts(self.vertices, self.faces)
    }
}
