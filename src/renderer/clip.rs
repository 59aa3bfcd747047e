use crate::vertex::ClipSpaceVertex;

// 透视除法前要求 w 严格为正
const W_EPSILON: f32 = 1e-5;

pub trait Clipper {
    // 接收一个裁剪空间的三角形
    // 返回裁剪后产生的零个、一个或多个三角形
    fn clip_triangle(&self, triangle: &[ClipSpaceVertex; 3]) -> Vec<[ClipSpaceVertex; 3]>;
}

/// 齐次空间近平面裁剪（z >= -w 且 w > 0）
///
/// 远平面在无穷远处，x/y 方向交给光栅化阶段的包围盒裁剪。
pub struct NearPlaneClipper;

fn near_distance(v: &ClipSpaceVertex) -> f32 {
    v.position.z + v.position.w
}

fn w_distance(v: &ClipSpaceVertex) -> f32 {
    v.position.w - W_EPSILON
}

// Sutherland–Hodgman，对单个平面裁剪凸多边形
fn clip_polygon(
    polygon: &[ClipSpaceVertex],
    distance: fn(&ClipSpaceVertex) -> f32,
) -> Vec<ClipSpaceVertex> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let d_cur = distance(current);
        let d_next = distance(next);

        if d_cur >= 0.0 {
            out.push(*current);
        }
        if (d_cur >= 0.0) != (d_next >= 0.0) {
            let t = d_cur / (d_cur - d_next);
            out.push(current.lerp(next, t));
        }
    }
    out
}

impl Clipper for NearPlaneClipper {
    fn clip_triangle(&self, triangle: &[ClipSpaceVertex; 3]) -> Vec<[ClipSpaceVertex; 3]> {
        let inside = |v: &ClipSpaceVertex| near_distance(v) >= 0.0 && w_distance(v) >= 0.0;
        // 完全可见时原样返回，保证和其他绘制调用的结果逐位一致
        if triangle.iter().all(inside) {
            return vec![*triangle];
        }

        let polygon = clip_polygon(triangle, near_distance);
        let polygon = clip_polygon(&polygon, w_distance);
        if polygon.len() < 3 {
            return vec![];
        }

        // 扇形三角化
        (1..polygon.len() - 1)
            .map(|i| [polygon[0], polygon[i], polygon[i + 1]])
            .collect()
    }
}
