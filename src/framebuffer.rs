use std::path::Path;

use cgmath::Vector3 as Vec3;
use image::{ImageBuffer, Rgba, RgbaImage};

use crate::renderer::pipeline::PipelineState;

pub const CLEAR_DEPTH: f32 = 1.0;

/// 0.0~1.0 的 RGB → 0xAARRGGBB，alpha 固定为 1
pub fn pack_color(color: Vec3<f32>) -> u32 {
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF000000 | to_byte(color.x) << 16 | to_byte(color.y) << 8 | to_byte(color.z)
}

#[cfg(test)]
pub fn unpack_color(color: u32) -> Vec3<f32> {
    Vec3::new(
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        (color & 0xFF) as f32 / 255.0,
    )
}

/// 颜色 + 深度 + 8 位模板
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u32>,
    pub depth: Vec<f32>,
    pub stencil: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        FrameBuffer {
            width,
            height,
            data: vec![0; width * height],
            depth: vec![CLEAR_DEPTH; width * height],
            stencil: vec![0; width * height],
        }
    }

    pub fn clear(&mut self, color: u32) {
        self.data.fill(color);
        self.depth.fill(CLEAR_DEPTH);
        self.stencil.fill(0);
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    fn checked_index(&self, x: usize, y: usize) -> usize {
        match self.index(x, y) {
            Some(idx) => idx,
            None => panic!(
                "pixel ({x}, {y}) outside {}x{} framebuffer",
                self.width, self.height
            ),
        }
    }

    /// 读取像素颜色；坐标必须在缓冲范围内，越界直接 panic
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.data[self.checked_index(x, y)]
    }

    /// 同 `pixel`，坐标必须在范围内
    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        self.depth[self.checked_index(x, y)]
    }

    /// 同 `pixel`，坐标必须在范围内
    pub fn stencil_at(&self, x: usize, y: usize) -> u8 {
        self.stencil[self.checked_index(x, y)]
    }

    /// 模板测试 → 深度测试 → 更新模板/深度
    ///
    /// 返回 true 表示片元通过，可以写颜色。
    pub fn process_fragment(
        &mut self,
        x: usize,
        y: usize,
        depth: f32,
        front_facing: bool,
        state: &PipelineState,
    ) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        let stored = self.stencil[idx];

        if let Some(stencil) = &state.stencil {
            if !stencil.test(front_facing, stored) {
                self.stencil[idx] = stencil.write(stored, stencil.face(front_facing).fail);
                return false;
            }
        }

        if !state.depth.compare.test(depth, self.depth[idx]) {
            if let Some(stencil) = &state.stencil {
                self.stencil[idx] = stencil.write(stored, stencil.face(front_facing).depth_fail);
            }
            return false;
        }

        if let Some(stencil) = &state.stencil {
            self.stencil[idx] = stencil.write(stored, stencil.face(front_facing).pass);
        }
        if state.depth.write {
            self.depth[idx] = depth;
        }
        true
    }

    pub fn write_color(&mut self, x: usize, y: usize, color: Vec3<f32>) {
        if let Some(idx) = self.index(x, y) {
            self.data[idx] = pack_color(color);
        }
    }

    pub fn ssaa(&self, factor: usize) -> Self {
        let factor = factor.max(1);
        let new_width = self.width / factor;
        let new_height = self.height / factor;
        let mut new_data = vec![0; new_width * new_height];
        let count = (factor * factor) as u32;

        for y in 0..new_height {
            for x in 0..new_width {
                let (mut a, mut r, mut g, mut b) = (0u32, 0u32, 0u32, 0u32);

                // 对高分辨率区域内的所有像素求平均（包括背景）
                for dy in 0..factor {
                    for dx in 0..factor {
                        let color = self.data[(y * factor + dy) * self.width + x * factor + dx];
                        a += (color >> 24) & 0xFF;
                        r += (color >> 16) & 0xFF;
                        g += (color >> 8) & 0xFF;
                        b += color & 0xFF;
                    }
                }

                new_data[y * new_width + x] =
                    (a / count) << 24 | (r / count) << 16 | (g / count) << 8 | (b / count);
            }
        }

        Self {
            width: new_width,
            height: new_height,
            data: new_data,
            // 降采样后的深度/模板不再参与渲染
            depth: vec![CLEAR_DEPTH; new_width * new_height],
            stencil: vec![0; new_width * new_height],
        }
    }

    pub fn to_image(&self) -> RgbaImage {
        ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, y| {
            let color = self.pixel(x as usize, y as usize);
            Rgba([
                ((color >> 16) & 0xFF) as u8,
                ((color >> 8) & 0xFF) as u8,
                (color & 0xFF) as u8,
                ((color >> 24) & 0xFF) as u8,
            ])
        })
    }

    pub fn save_to_image(&self, path: &Path) -> Result<(), image::ImageError> {
        self.to_image().save(path)
    }

    // 近处亮，远处暗
    pub fn save_depth_as_image(&self, path: &Path) -> Result<(), image::ImageError> {
        let img = ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, y| {
            let depth = self.depth_at(x as usize, y as usize).clamp(0.0, 1.0);
            let val = ((1.0 - depth) * 255.0) as u8;
            Rgba([val, val, val, 255])
        });
        img.save(path)
    }

    // 模板值非零的像素（阴影）标成白色
    pub fn save_stencil_as_image(&self, path: &Path) -> Result<(), image::ImageError> {
        let img = ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, y| {
            let val: u8 = if self.stencil_at(x as usize, y as usize) != 0 {
                255
            } else {
                0
            };
            Rgba([val, val, val, 255])
        });
        img.save(path)
    }
}
