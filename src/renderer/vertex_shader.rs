use crate::vertex::{ClipSpaceVertex, Triangle};
use cgmath::{InnerSpace, Matrix4 as Mat4, Vector3 as Vec3, Vector4 as Vec4, Zero};

pub struct VertexShaderUniforms<'a> {
    pub model_matrix: &'a Mat4<f32>,
    pub view_proj_matrix: &'a Mat4<f32>,
    /// 世界空间光照方向（单位向量）
    pub light_direction: Vec3<f32>,
}

impl VertexShaderUniforms<'_> {
    // 所有顶点着色器共用，阴影体前盖和网格本身的深度才能逐位相同
    pub fn transform_position(&self, pos: Vec3<f32>) -> Vec4<f32> {
        *self.view_proj_matrix * (*self.model_matrix * pos.extend(1.0))
    }

    /// 只做旋转，不受平移影响
    pub fn transform_normal(&self, normal: Vec3<f32>) -> Vec3<f32> {
        (*self.model_matrix * normal.extend(0.0)).truncate()
    }
}

pub trait VertexShader {
    // 接收一个模型空间的三角形和uniforms
    // 返回一个裁剪空间的三角形
    fn shade_triangle(
        &self,
        triangle: &Triangle,
        uniforms: &VertexShaderUniforms,
    ) -> [ClipSpaceVertex; 3];
}

/// 环境光和直射光两遍共用的顶点阶段
pub struct MeshVertexShader;

impl VertexShader for MeshVertexShader {
    fn shade_triangle(
        &self,
        triangle: &Triangle,
        uniforms: &VertexShaderUniforms,
    ) -> [ClipSpaceVertex; 3] {
        triangle.vertices.map(|v| {
            let normal = uniforms.transform_normal(v.normal);
            ClipSpaceVertex {
                position: uniforms.transform_position(v.pos),
                normal: if normal.magnitude2() > 0.0 {
                    normal.normalize()
                } else {
                    Vec3::zero()
                },
            }
        })
    }
}

/// 阴影体顶点阶段
///
/// 法线背对光源（与光照方向点积为正）的顶点被推到光照方向上的无穷远点（w = 0），
/// 其余顶点留在原位。
pub struct ShadowVertexShader;

impl VertexShader for ShadowVertexShader {
    fn shade_triangle(
        &self,
        triangle: &Triangle,
        uniforms: &VertexShaderUniforms,
    ) -> [ClipSpaceVertex; 3] {
        let at_infinity = *uniforms.view_proj_matrix * uniforms.light_direction.extend(0.0);
        triangle.vertices.map(|v| {
            let normal = uniforms.transform_normal(v.normal);
            let position = if normal.dot(uniforms.light_direction) > 0.0 {
                at_infinity
            } else {
                uniforms.transform_position(v.pos)
            };
            ClipSpaceVertex { position, normal }
        })
    }
}
