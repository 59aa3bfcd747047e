pub mod clip;
pub mod fragment_shader;
pub mod pipeline;
pub mod vertex_shader;

use crate::camera::Camera;
use crate::framebuffer::FrameBuffer;
use crate::rasterizer;
use crate::vertex::{ClipSpaceVertex, RasterPoint, RasterTriangle, Triangle};
use cgmath::{InnerSpace, Matrix4 as Mat4, Vector2 as Vec2, Vector3 as Vec3};

use self::clip::{Clipper, NearPlaneClipper};
use self::fragment_shader::{FragmentData, FragmentShader, LambertShader, ShadowFragmentShader};
use self::pipeline::PipelineState;
use self::vertex_shader::{MeshVertexShader, ShadowVertexShader, VertexShader, VertexShaderUniforms};

pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// 场景常量：方向光 + 环境光
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// 光线传播方向（单位向量）
    pub direction: Vec3<f32>,
    pub color: Vec3<f32>,
    pub ambient: Vec3<f32>,
}

impl Light {
    pub fn new(direction: Vec3<f32>, color: Vec3<f32>, ambient: Vec3<f32>) -> Self {
        Self {
            direction: direction.normalize(),
            color,
            ambient,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(
            Vec3::new(0.0, -0.2, 1.0),
            Vec3::new(0.8, 0.2, 0.2),
            Vec3::new(0.1, 0.1, 0.1),
        )
    }
}

/// 一帧里每个模型依次执行的三遍绘制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Ambient,
    Shadow,
    Lit,
}

impl Pass {
    pub const ORDER: [Pass; 3] = [Pass::Ambient, Pass::Shadow, Pass::Lit];

    pub fn state(self) -> PipelineState {
        match self {
            Pass::Ambient => PipelineState::ambient(),
            Pass::Shadow => PipelineState::shadow(),
            Pass::Lit => PipelineState::lit(),
        }
    }
}

pub struct Renderer {
    pub(crate) camera: Camera,
    pub(crate) framebuffer: FrameBuffer,
    pub(crate) viewport: Viewport,
    pub(crate) light: Light,
    view_proj: Mat4<f32>,
    clear_color: u32,
}

impl Renderer {
    pub fn new(camera: Camera, light: Light, w: usize, h: usize, clear_color: u32) -> Self {
        Self {
            view_proj: camera.get_view_proj_mat(),
            camera,
            framebuffer: FrameBuffer::new(w, h),
            viewport: Viewport {
                x: 0,
                y: 0,
                w: w as i32,
                h: h as i32,
            },
            light,
            clear_color,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// 颜色、深度、模板全部清空
    pub fn clear(&mut self) {
        self.framebuffer.clear(self.clear_color);
    }

    /// 用某一遍的着色器和管线状态绘制整个网格
    pub fn draw(&mut self, mesh: &[Triangle], model: &Mat4<f32>, pass: Pass) {
        let state = pass.state();
        match pass {
            Pass::Ambient => {
                let fs = LambertShader::ambient(&self.light);
                self.draw_with(mesh, model, &MeshVertexShader, &fs, &state);
            }
            Pass::Shadow => {
                self.draw_with(mesh, model, &ShadowVertexShader, &ShadowFragmentShader, &state);
            }
            Pass::Lit => {
                let fs = LambertShader::lit(&self.light);
                self.draw_with(mesh, model, &MeshVertexShader, &fs, &state);
            }
        }
    }

    pub fn draw_with(
        &mut self,
        mesh: &[Triangle],
        model: &Mat4<f32>,
        vertex_shader: &dyn VertexShader,
        fragment_shader: &dyn FragmentShader,
        state: &PipelineState,
    ) {
        let view_proj = self.view_proj;
        let uniforms = VertexShaderUniforms {
            model_matrix: model,
            view_proj_matrix: &view_proj,
            light_direction: self.light.direction,
        };
        let clipper = NearPlaneClipper;

        for triangle in mesh {
            //管线阶段 1: 顶点着色
            let clip_space_triangle = vertex_shader.shade_triangle(triangle, &uniforms);

            //管线阶段 2: 裁剪
            for clipped in clipper.clip_triangle(&clip_space_triangle) {
                //管线阶段 3: 屏幕映射，退化三角形直接丢弃
                let Some(raster_triangle) = self.viewport_transform(&clipped) else {
                    continue;
                };
                //管线阶段 4: 光栅化、深度/模板测试、像素着色
                self.rasterize_triangle(&raster_triangle, fragment_shader, state);
            }
        }
    }

    //视口变换
    fn viewport_transform(&self, clip_triangle: &[ClipSpaceVertex; 3]) -> Option<RasterTriangle> {
        let mut vertices = clip_triangle.map(|clip_v| {
            // 透视除法
            let ndc = clip_v.position / clip_v.position.w;
            let screen_x = (ndc.x + 1.0) * 0.5 * self.viewport.w as f32 + self.viewport.x as f32;
            let screen_y = self.viewport.h as f32 - (ndc.y + 1.0) * 0.5 * self.viewport.h as f32
                + self.viewport.y as f32;

            RasterPoint {
                pos: Vec2::new(screen_x, screen_y),
                z: ((ndc.z + 1.0) * 0.5).clamp(0.0, 1.0),
                normal: clip_v.normal,
            }
        });

        let area = rasterizer::signed_area(&vertices.map(|v| v.pos));
        if area == 0.0 || !area.is_finite() {
            return None;
        }
        // 屏幕 y 轴向下，NDC 中逆时针的三角形在这里面积为负，即正面
        let front_facing = area < 0.0;
        if front_facing {
            vertices.swap(1, 2);
        }
        Some(RasterTriangle {
            vertices,
            front_facing,
        })
    }

    // 进行光栅化
    fn rasterize_triangle(
        &mut self,
        triangle: &RasterTriangle,
        shader: &dyn FragmentShader,
        state: &PipelineState,
    ) {
        let points = &triangle.vertices;
        let positions = points.map(|p| p.pos);
        let Some((min_x, min_y, max_x, max_y)) =
            rasterizer::get_box(&positions, self.framebuffer.width, self.framebuffer.height)
        else {
            return;
        };

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let Some(bary) = rasterizer::get_barycentric_coords(&positions, p) else {
                    continue;
                };

                let depth = rasterizer::interpolate_depth(points, bary);
                if !self
                    .framebuffer
                    .process_fragment(x, y, depth, triangle.front_facing, state)
                {
                    continue;
                }
                if !state.color_write {
                    continue;
                }

                let fragment_data = FragmentData {
                    normal: rasterizer::interpolate_normal(points, bary),
                };
                let color = shader.shade(fragment_data);
                self.framebuffer.write_color(x, y, color);
            }
        }
    }
}
