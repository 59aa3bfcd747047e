use cgmath::{Matrix4 as Mat4, Rad, Vector3 as Vec3};

use crate::geometry::{self, Mesh};
use crate::json_struct::{JsonConfig, PassSchedule};
use crate::renderer::{Pass, Renderer};
use crate::shadow_volume::{ShadowVolumeBuilder, ShadowVolumeStats};

/// 模型实例的运动方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// 先绕 X 轴倾斜 `tilt`，再按 t/1000 弧度绕 Y 轴旋转
    Spin { tilt: f32 },
    /// 固定变换
    Fixed(Mat4<f32>),
}

impl Motion {
    pub fn model_matrix(&self, elapsed_ms: f32) -> Mat4<f32> {
        match *self {
            Motion::Spin { tilt } => spin_matrix(elapsed_ms, tilt),
            Motion::Fixed(m) => m,
        }
    }
}

/// M(t) = Ry(t / 1000) · Rx(tilt)
pub fn spin_matrix(elapsed_ms: f32, tilt: f32) -> Mat4<f32> {
    Mat4::from_angle_y(Rad(elapsed_ms / 1000.0)) * Mat4::from_angle_x(Rad(tilt))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub instance: usize,
    pub pass: Pass,
    pub model: Mat4<f32>,
}

/// 网格数据启动时构建一次，之后只读；每帧只有模型矩阵随时间变化
pub struct Scene {
    base: Mesh,
    shadow: Mesh,
    stats: ShadowVolumeStats,
    instances: Vec<Motion>,
    schedule: PassSchedule,
}

impl Scene {
    pub fn new(base: Mesh, instances: Vec<Motion>, schedule: PassSchedule) -> Self {
        let volume = ShadowVolumeBuilder::default().build(&base);
        Self {
            base,
            shadow: volume.triangles,
            stats: volume.stats,
            instances,
            schedule,
        }
    }

    /// 旋转立方体 + 静止立方体（纯平移）
    pub fn from_config(config: &JsonConfig, mesh: Option<Mesh>) -> Self {
        let base = mesh.unwrap_or_else(|| geometry::cube(config.scene.half_extent));
        let instances = vec![
            Motion::Spin {
                tilt: config.scene.tilt,
            },
            Motion::Fixed(Mat4::from_translation(Vec3::from(
                config.scene.static_offset,
            ))),
        ];
        Self::new(base, instances, config.scene.schedule)
    }

    pub fn base(&self) -> &Mesh {
        &self.base
    }

    pub fn shadow(&self) -> &Mesh {
        &self.shadow
    }

    pub fn stats(&self) -> &ShadowVolumeStats {
        &self.stats
    }

    pub fn mesh_for(&self, pass: Pass) -> &Mesh {
        match pass {
            Pass::Shadow => &self.shadow,
            Pass::Ambient | Pass::Lit => &self.base,
        }
    }

    /// 这一帧要执行的绘制调用，顺序即执行顺序
    pub fn draw_calls(&self, elapsed_ms: f32) -> Vec<DrawCall> {
        let models: Vec<Mat4<f32>> = self
            .instances
            .iter()
            .map(|m| m.model_matrix(elapsed_ms))
            .collect();

        let call = |instance: usize, pass: Pass| DrawCall {
            instance,
            pass,
            model: models[instance],
        };
        match self.schedule {
            PassSchedule::PerInstance => (0..models.len())
                .flat_map(|i| Pass::ORDER.map(|pass| call(i, pass)))
                .collect(),
            PassSchedule::PerPass => Pass::ORDER
                .iter()
                .flat_map(|&pass| (0..models.len()).map(move |i| call(i, pass)))
                .collect(),
        }
    }

    /// 渲染一帧：清空缓冲后按顺序执行所有绘制调用
    pub fn render(&self, renderer: &mut Renderer, elapsed_ms: f32) {
        renderer.clear();
        for call in self.draw_calls(elapsed_ms) {
            log::trace!("draw {:?} for instance {}", call.pass, call.instance);
            renderer.draw(self.mesh_for(call.pass), &call.model, call.pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, Frustum};
    use crate::framebuffer::{pack_color, unpack_color};
    use crate::renderer::Light;
    use crate::renderer::fragment_shader::gamma_encode;
    use cgmath::{Deg, InnerSpace, Point3, SquareMatrix, Vector4 as Vec4};

    #[test]
    fn spin_at_zero_is_pure_tilt() {
        let m = spin_matrix(0.0, 0.4);
        assert_eq!(m, Mat4::from_angle_x(Rad(0.4)));
    }

    #[test]
    fn spin_applies_tilt_before_rotation() {
        // 先 Rx 再 Ry：Y 轴上的点经过倾斜后再绕 Y 旋转
        let m = spin_matrix(std::f32::consts::FRAC_PI_2 * 1000.0, 0.4);
        let p = m * Vec4::new(0.0, 1.0, 0.0, 1.0);
        let tilted = Mat4::from_angle_x(Rad(0.4)) * Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert!((p.y - tilted.y).abs() < 1e-5);
        assert!((p.x - tilted.z).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
    }

    #[test]
    fn default_scene_builds_both_meshes() {
        let scene = Scene::from_config(&JsonConfig::default(), None);
        assert_eq!(scene.base().len(), 12);
        assert_eq!(scene.shadow().len(), 48);
        assert_eq!(scene.stats().glue_quads, 18);
    }

    #[test]
    fn per_instance_schedule_order() {
        let scene = Scene::from_config(&JsonConfig::default(), None);
        let order: Vec<(usize, Pass)> = scene
            .draw_calls(0.0)
            .iter()
            .map(|c| (c.instance, c.pass))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, Pass::Ambient),
                (0, Pass::Shadow),
                (0, Pass::Lit),
                (1, Pass::Ambient),
                (1, Pass::Shadow),
                (1, Pass::Lit),
            ]
        );
    }

    #[test]
    fn per_pass_schedule_order() {
        let mut config = JsonConfig::default();
        config.scene.schedule = PassSchedule::PerPass;
        let scene = Scene::from_config(&config, None);
        let passes: Vec<Pass> = scene.draw_calls(0.0).iter().map(|c| c.pass).collect();
        assert_eq!(
            passes,
            vec![
                Pass::Ambient,
                Pass::Ambient,
                Pass::Shadow,
                Pass::Shadow,
                Pass::Lit,
                Pass::Lit,
            ]
        );
    }

    #[test]
    fn static_instance_only_translates() {
        let config = JsonConfig::default();
        let scene = Scene::from_config(&config, None);
        let a = scene.draw_calls(0.0);
        let b = scene.draw_calls(2500.0);
        assert_ne!(a[0].model, b[0].model);
        assert_eq!(a[3].model, b[3].model);
        assert_eq!(
            a[3].model,
            Mat4::from_translation(Vec3::from(config.scene.static_offset))
        );
    }

    #[test]
    fn default_scene_renders_something() {
        let config = JsonConfig::default();
        let scene = Scene::from_config(&config, None);
        let mut renderer = Renderer::new(config.camera(), config.light(), 64, 64, 0xFF000000);
        scene.render(&mut renderer, 1234.0);
        let drawn = renderer
            .framebuffer()
            .data
            .iter()
            .filter(|&&c| c != 0xFF000000)
            .count();
        assert!(drawn > 0);
    }

    // 光沿 -Z 略偏 +X 传播，小立方体挡在大立方体前面，
    // 影子落在大立方体朝向相机的那一面上
    fn occluder_scene() -> (Scene, Renderer) {
        let receiver = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)) * Mat4::from_scale(4.0);
        let occluder = Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0));
        let scene = Scene::new(
            geometry::cube(0.5),
            vec![Motion::Fixed(receiver), Motion::Fixed(occluder)],
            PassSchedule::PerPass,
        );
        let camera = Camera::new(
            Frustum::new(0.5, 1.0, Deg(60.0).into()),
            Point3::new(0.0, 0.0, 6.0),
            Point3::new(0.0, 0.0, 0.0),
        );
        let light = Light::new(
            Vec3::new(0.3, 0.0, -1.0),
            Vec3::new(0.8, 0.2, 0.2),
            Vec3::new(0.1, 0.1, 0.1),
        );
        let renderer = Renderer::new(camera, light, 64, 64, 0xFF000000);
        (scene, renderer)
    }

    #[test]
    fn occluder_casts_shadow_on_receiver() {
        let (scene, mut renderer) = occluder_scene();
        scene.render(&mut renderer, 0.0);
        let fb = renderer.framebuffer();
        let light = renderer.light;
        let ambient = pack_color(gamma_encode(light.ambient));

        // (40, 31) 在影子里：模板非零，只剩环境光
        assert_ne!(fb.stencil_at(40, 31), 0);
        assert_eq!(fb.pixel(40, 31), ambient);

        // (44, 31) 在影子外：被直射光照亮
        assert_eq!(fb.stencil_at(44, 31), 0);
        let lit = unpack_color(fb.pixel(44, 31));
        let expected = gamma_encode(
            light.ambient + light.color * -light.direction.dot(Vec3::new(0.0, 0.0, 1.0)),
        );
        assert!((lit - expected).magnitude() < 2.0 / 255.0);
    }

    #[test]
    fn convex_mesh_alone_is_not_self_shadowed() {
        let (_, mut renderer) = occluder_scene();
        let scene = Scene::new(
            geometry::cube(0.5),
            vec![Motion::Fixed(Mat4::identity())],
            PassSchedule::PerInstance,
        );
        scene.render(&mut renderer, 0.0);
        let fb = renderer.framebuffer();
        // +Z 面朝向光源，整面被照亮，模板全为 0
        for x in 28..36 {
            assert_eq!(fb.stencil_at(x, 32), 0);
            assert_ne!(fb.pixel(x, 32), pack_color(gamma_encode(renderer.light.ambient)));
        }
    }
}
