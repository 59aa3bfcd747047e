use cgmath::{Vector3 as Vec3, Zero};

use crate::vertex::{Triangle, Vertex};

/// 有序三角形序列
pub type Mesh = Vec<Triangle>;

// 立方体六个面，按角点编号（bit0 = x, bit1 = y, bit2 = z）
// 顶点顺序保证 (b - a) × (a - c) 指向外侧
const CUBE_FACES: [[usize; 4]; 6] = [
    [1, 5, 7, 3], // +X
    [0, 2, 6, 4], // -X
    [2, 3, 7, 6], // +Y
    [0, 4, 5, 1], // -Y
    [4, 6, 7, 5], // +Z
    [0, 1, 3, 2], // -Z
];

/// 四边形沿 v0-v2 对角线拆成两个三角形：(v0, v1, v2), (v0, v2, v3)
pub fn split_quad(v: [Vertex; 4]) -> [Triangle; 2] {
    [
        Triangle::new(v[0], v[1], v[2]),
        Triangle::new(v[0], v[2], v[3]),
    ]
}

/// 四个角点 → 两个平面三角形，各自计算面法线
pub fn quad(p: [Vec3<f32>; 4]) -> [Triangle; 2] {
    [
        Triangle::flat(p[0], p[1], p[2]),
        Triangle::flat(p[0], p[2], p[3]),
    ]
}

pub fn triangles_from_quads(quads: &[[Vec3<f32>; 4]]) -> Mesh {
    quads.iter().flat_map(|q| quad(*q)).collect()
}

pub fn cube_corners(half_extent: f32) -> [Vec3<f32>; 8] {
    std::array::from_fn(|i| {
        let pick = |bit: usize| {
            if i & bit != 0 {
                half_extent
            } else {
                -half_extent
            }
        };
        Vec3::new(pick(1), pick(2), pick(4))
    })
}

pub fn cube_quads(half_extent: f32) -> [[Vec3<f32>; 4]; 6] {
    let corners = cube_corners(half_extent);
    CUBE_FACES.map(|face| face.map(|i| corners[i]))
}

/// 以原点为中心的立方体，12 个三角形
pub fn cube(half_extent: f32) -> Mesh {
    triangles_from_quads(&cube_quads(half_extent))
}

/// 所有三角形重心的平均值
pub fn mesh_centroid(mesh: &[Triangle]) -> Vec3<f32> {
    if mesh.is_empty() {
        return Vec3::zero();
    }
    let sum = mesh
        .iter()
        .fold(Vec3::zero(), |acc, tri| acc + tri.get_center());
    sum / mesh.len() as f32
}
