use cgmath::{InnerSpace, Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4, Zero};

/// 模型空间顶点：位置 + 面法线（平面着色，不做顶点法线平滑）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Vec3<f32>,
    pub normal: Vec3<f32>,
}

impl Vertex {
    pub fn new(pos: Vec3<f32>, normal: Vec3<f32>) -> Self {
        Self { pos, normal }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Vertex {
            pos: Vec3::zero(),
            normal: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

/// 三个顶点的有序三元组，顶点顺序决定法线朝向
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    /// 面法线 = normalize((b - a) × (a - c))
    ///
    /// 退化三角形（叉积为零）返回零向量，而不是 NaN。
    pub fn compute_normal(a: Vec3<f32>, b: Vec3<f32>, c: Vec3<f32>) -> Vec3<f32> {
        let n = (b - a).cross(a - c);
        if n.magnitude2() == 0.0 {
            return Vec3::zero();
        }
        n.normalize()
    }

    /// 用三个位置构造平面三角形，三个顶点共享同一条面法线
    pub fn flat(a: Vec3<f32>, b: Vec3<f32>, c: Vec3<f32>) -> Self {
        let normal = Self::compute_normal(a, b, c);
        Self {
            vertices: [
                Vertex::new(a, normal),
                Vertex::new(b, normal),
                Vertex::new(c, normal),
            ],
        }
    }

    /// 顶点自带法线（连接面使用两侧三角形的法线）
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    pub fn get_center(&self) -> Vec3<f32> {
        (self.vertices[0].pos + self.vertices[1].pos + self.vertices[2].pos) / 3.0
    }

    pub fn get_normal(&self) -> Vec3<f32> {
        Self::compute_normal(
            self.vertices[0].pos,
            self.vertices[1].pos,
            self.vertices[2].pos,
        )
    }

    /// 三条有向边 a→b, b→c, c→a
    pub fn edges(&self) -> [(Vec3<f32>, Vec3<f32>); 3] {
        let [a, b, c] = self.vertices;
        [(a.pos, b.pos), (b.pos, c.pos), (c.pos, a.pos)]
    }
}

/// 顶点着色器输出（齐次裁剪空间）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSpaceVertex {
    pub position: Vec4<f32>,
    pub normal: Vec3<f32>,
}

impl ClipSpaceVertex {
    /// 裁剪时在两个顶点之间线性插值
    pub fn lerp(&self, other: &ClipSpaceVertex, t: f32) -> ClipSpaceVertex {
        ClipSpaceVertex {
            position: self.position + (other.position - self.position) * t,
            normal: self.normal + (other.normal - self.normal) * t,
        }
    }
}

/// 光栅化阶段的 2D 点（带深度）
#[derive(Debug, Clone, Copy)]
pub struct RasterPoint {
    pub pos: Vec2<f32>,
    pub normal: Vec3<f32>,
    pub z: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct RasterTriangle {
    pub vertices: [RasterPoint; 3],
    pub front_facing: bool,
}
