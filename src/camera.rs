use cgmath::{Matrix4 as Mat4, Point3, Rad, Vector3 as Vec3};

/// 透视视锥，远平面放在无穷远处
///
/// 阴影体把背光顶点推到 w = 0 的无穷远点，有限远平面会把这些顶点裁掉。
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    near: f32,
    mat: Mat4<f32>,
}

impl Frustum {
    #[rustfmt::skip]
    pub fn new(near: f32, aspect: f32, fovy: Rad<f32>) -> Self {
        let tan_half_fovy = (fovy.0 / 2.0).tan();
        let a = 1.0 / (aspect * tan_half_fovy);
        let b = 1.0 / tan_half_fovy;
        // far → ∞ 时 c = -1, d = -2n
        let c = -1.0;
        let d = -2.0 * near;

        // 列主序
        let mat = Mat4::new(
            a,    0.0,   0.0,   0.0,
            0.0,  b,     0.0,   0.0,
            0.0,  0.0,   c,    -1.0,
            0.0,  0.0,   d,     0.0,
        );

        Self { near, mat }
    }

    pub fn get_mat(&self) -> &Mat4<f32> {
        &self.mat
    }

    pub fn near(&self) -> f32 {
        self.near
    }
}

/// 固定机位，场景里只有模型矩阵随时间变化
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    frustum: Frustum,
    pub(crate) eye: Point3<f32>,
    pub(crate) target: Point3<f32>,
    pub(crate) up: Vec3<f32>,
}

impl Camera {
    pub fn new(frustum: Frustum, eye: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            frustum,
            eye,
            target,
            up: Vec3::new(0.0, 1.0, 0.0),
        }
    }

    pub fn get_frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn get_view_mat(&self) -> Mat4<f32> {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn get_view_proj_mat(&self) -> Mat4<f32> {
        self.frustum.get_mat() * self.get_view_mat()
    }
}
