use crate::vertex::RasterPoint;
use cgmath::{InnerSpace, Vector2 as Vec2, Vector3 as Vec3, Zero};

/// 点 p 相对有向边 a→b 的边函数（二倍有向面积）
pub fn edge_function(a: Vec2<f32>, b: Vec2<f32>, p: Vec2<f32>) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

pub fn signed_area(vertices: &[Vec2<f32>; 3]) -> f32 {
    edge_function(vertices[0], vertices[1], vertices[2])
}

/// 像素中心恰好落在边上时的归属规则
///
/// 共享边在两个三角形里方向相反，d 和 -d 只有一个返回 true，
/// 保证同一像素不会被相邻三角形重复光栅化（模板计数依赖这一点）。
pub fn is_top_left(a: Vec2<f32>, b: Vec2<f32>) -> bool {
    let d = b - a;
    d.y > 0.0 || (d.y == 0.0 && d.x < 0.0)
}

/// 重心坐标 (w0, w1, w2)，要求三角形有向面积为正
///
/// 像素不在三角形内（按归属规则）时返回 None。
pub fn get_barycentric_coords(vertices: &[Vec2<f32>; 3], p: Vec2<f32>) -> Option<(f32, f32, f32)> {
    let area = signed_area(vertices);
    if area <= 0.0 {
        return None;
    }
    let [v0, v1, v2] = *vertices;
    let edges = [(v1, v2), (v2, v0), (v0, v1)];

    let mut weights = [0.0; 3];
    for (w, (a, b)) in weights.iter_mut().zip(edges) {
        let e = edge_function(a, b, p);
        if e < 0.0 || (e == 0.0 && !is_top_left(a, b)) {
            return None;
        }
        *w = e / area;
    }
    Some((weights[0], weights[1], weights[2]))
}

/// 包围盒，裁到 [0, width) × [0, height)；完全在屏幕外返回 None
pub fn get_box(
    vertices: &[Vec2<f32>; 3],
    width: usize,
    height: usize,
) -> Option<(usize, usize, usize, usize)> {
    let min_x = vertices.iter().map(|v| v.x).fold(f32::INFINITY, f32::min);
    let max_x = vertices.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = vertices.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
    let max_y = vertices.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max);

    if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_x < 0.0 || max_y < 0.0 || min_x >= width as f32 || min_y >= height as f32 {
        return None;
    }

    let clamp = |v: f32, limit: usize| (v.max(0.0) as usize).min(limit.saturating_sub(1));
    Some((
        clamp(min_x.floor(), width),
        clamp(min_y.floor(), height),
        clamp(max_x.ceil(), width),
        clamp(max_y.ceil(), height),
    ))
}

pub fn interpolate_depth(points: &[RasterPoint; 3], bary: (f32, f32, f32)) -> f32 {
    let (w0, w1, w2) = bary;
    points[0].z * w0 + points[1].z * w1 + points[2].z * w2
}

pub fn interpolate_normal(points: &[RasterPoint; 3], bary: (f32, f32, f32)) -> Vec3<f32> {
    let (w0, w1, w2) = bary;
    let n = points[0].normal * w0 + points[1].normal * w1 + points[2].normal * w2;
    if n.magnitude2() == 0.0 {
        return Vec3::zero();
    }
    n.normalize()
}
