use cgmath::{InnerSpace, Vector3 as Vec3, Zero};

use crate::renderer::Light;

pub const GAMMA: f32 = 2.2;

#[derive(Debug, Clone, Copy)]
pub struct FragmentData {
    pub normal: Vec3<f32>,
}

// 定义 Shader 的通用行为
pub trait FragmentShader: Sync {
    // 输入插值后的片元数据，输出最终的颜色 (0.0 ~ 1.0 范围的 Vec3)
    fn shade(&self, data: FragmentData) -> Vec3<f32>;
}

pub fn gamma_encode(color: Vec3<f32>) -> Vec3<f32> {
    color.map(|c| c.max(0.0).powf(1.0 / GAMMA))
}

/// 环境光 + 方向光漫反射，最后做伽马编码
///
/// color = ambient + max(0, light_color * -dot(light_direction, normal))
pub struct LambertShader {
    pub ambient: Vec3<f32>,
    pub light_color: Vec3<f32>,
    pub light_direction: Vec3<f32>,
}

impl LambertShader {
    /// 环境光那一遍：没有直射光分量
    pub fn ambient(light: &Light) -> Self {
        Self {
            ambient: light.ambient,
            light_color: Vec3::zero(),
            light_direction: light.direction,
        }
    }

    pub fn lit(light: &Light) -> Self {
        Self {
            ambient: light.ambient,
            light_color: light.color,
            light_direction: light.direction,
        }
    }

    /// 伽马编码之前的线性颜色
    pub fn shade_linear(&self, normal: Vec3<f32>) -> Vec3<f32> {
        let diffuse = (self.light_color * -self.light_direction.dot(normal)).map(|c| c.max(0.0));
        self.ambient + diffuse
    }
}

impl FragmentShader for LambertShader {
    fn shade(&self, data: FragmentData) -> Vec3<f32> {
        gamma_encode(self.shade_linear(data.normal))
    }
}

/// 阴影体那一遍不输出颜色
pub struct ShadowFragmentShader;

impl FragmentShader for ShadowFragmentShader {
    fn shade(&self, _data: FragmentData) -> Vec3<f32> {
        Vec3::zero()
    }
}
