use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use cgmath::Vector3 as Vec3;
use minifb::{Key, Window, WindowOptions};
use rayon::prelude::*;

use crate::framebuffer::pack_color;
use crate::geometry::mesh_centroid;
use crate::json_struct::JsonConfig;
use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::shadow_volume::{EdgeOrdering, ShadowVolumeBuilder};

/// 动画时间：每帧把间隔累加到已用时间上
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    pub elapsed_ms: f32,
    pub frame: u64,
}

impl FrameClock {
    /// 负间隔按 0 处理，时间单调不减
    pub fn advance(self, delta_ms: f32) -> Self {
        Self {
            elapsed_ms: self.elapsed_ms + delta_ms.max(0.0),
            frame: self.frame + 1,
        }
    }
}

pub fn build_renderer(config: &JsonConfig, ssaa: usize) -> Renderer {
    let ssaa = ssaa.max(1);
    Renderer::new(
        config.camera(),
        config.light(),
        config.viewport.width * ssaa,
        config.viewport.height * ssaa,
        pack_color(Vec3::from(config.viewport.clear_color)),
    )
}

/// 窗口模式：每次刷新渲染一帧，直到窗口关闭或按下 Esc
pub fn run_window(scene: &Scene, config: &JsonConfig) -> Result<()> {
    let (width, height) = (config.viewport.width, config.viewport.height);
    let mut window = Window::new(env!("CARGO_PKG_NAME"), width, height, WindowOptions::default())
        .context("failed to open window")?;
    window.set_target_fps(60);

    let mut renderer = build_renderer(config, 1);
    let camera = renderer.camera();
    log::info!(
        "{width}x{height} window, eye {:?}, near plane {}",
        camera.eye,
        camera.get_frustum().near()
    );
    let mut clock = FrameClock::default();
    let mut last = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let now = Instant::now();
        clock = clock.advance((now - last).as_secs_f32() * 1000.0);
        last = now;

        scene.render(&mut renderer, clock.elapsed_ms);
        window
            .update_with_buffer(&renderer.framebuffer().data, width, height)
            .context("failed to present frame")?;
    }

    log::info!(
        "window closed after {} frames ({:.1}s)",
        clock.frame,
        clock.elapsed_ms / 1000.0
    );
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub frames: usize,
    pub step_ms: f32,
    pub out_dir: PathBuf,
    pub ssaa: usize,
    /// 额外输出深度和模板缓冲
    pub dump_buffers: bool,
}

fn frame_path(dir: &Path, kind: &str, index: usize) -> PathBuf {
    dir.join(format!("{kind}_{index:03}.png"))
}

/// 离屏渲染若干帧保存为 PNG；帧之间互不依赖，并行渲染
pub fn export_frames(scene: &Scene, config: &JsonConfig, options: &ExportOptions) -> Result<usize> {
    std::fs::create_dir_all(&options.out_dir)
        .with_context(|| format!("failed to create {}", options.out_dir.display()))?;

    let clock_at = |index: usize| {
        (0..index).fold(FrameClock::default(), |clock, _| clock.advance(options.step_ms))
    };

    (0..options.frames)
        .into_par_iter()
        .map(|index| -> Result<()> {
            let clock = clock_at(index);
            let mut renderer = build_renderer(config, options.ssaa);
            scene.render(&mut renderer, clock.elapsed_ms);

            let fb = renderer.framebuffer();
            let path = frame_path(&options.out_dir, "frame", index);
            fb.ssaa(options.ssaa)
                .save_to_image(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;

            if options.dump_buffers {
                let depth = frame_path(&options.out_dir, "depth", index);
                fb.save_depth_as_image(&depth)
                    .with_context(|| format!("failed to write {}", depth.display()))?;
                let stencil = frame_path(&options.out_dir, "stencil", index);
                fb.save_stencil_as_image(&stencil)
                    .with_context(|| format!("failed to write {}", stencil.display()))?;
            }
            log::debug!("frame {index} at {:.0}ms -> {}", clock.elapsed_ms, path.display());
            Ok(())
        })
        .collect::<Result<Vec<()>>>()?;

    Ok(options.frames)
}

/// 输出网格和阴影体统计
///
/// 另用降序边方向重建一次阴影体：流形网格上两种方向得到的连接面数量相同，
/// 不同说明网格有重复边。返回两种方向的连接面数量是否一致。
pub fn inspect(scene: &Scene) -> bool {
    let stats = scene.stats();
    let centroid = mesh_centroid(scene.base());
    log::info!(
        "base mesh: {} triangles, centroid ({:.3}, {:.3}, {:.3})",
        stats.base_triangles,
        centroid.x,
        centroid.y,
        centroid.z
    );
    log::info!(
        "directed edges: {} ({} unique)",
        stats.directed_edges,
        stats.unique_edges
    );
    log::info!(
        "glue quads: {} ({} triangles)",
        stats.glue_quads,
        stats.glue_quads * 2
    );
    log::info!("shadow mesh: {} triangles", scene.shadow().len());
    if stats.boundary_edges > 0 {
        log::warn!(
            "{} boundary edges: mesh is open, shadow volume has no caps there",
            stats.boundary_edges
        );
    }
    if stats.duplicate_edges > 0 {
        log::warn!("{} duplicated directed edges: mesh is non-manifold", stats.duplicate_edges);
    }

    let reversed = ShadowVolumeBuilder::new(EdgeOrdering::Descending).build(scene.base());
    let consistent = reversed.glue_quads.len() == stats.glue_quads;
    if !consistent {
        log::warn!(
            "edge ordering changes the glue quads: {} ascending vs {} descending",
            stats.glue_quads,
            reversed.glue_quads.len()
        );
    }
    consistent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_accumulates_deltas() {
        let clock = [16.0, 17.0, 16.5]
            .iter()
            .fold(FrameClock::default(), |c, &d| c.advance(d));
        assert_eq!(clock.elapsed_ms, 49.5);
        assert_eq!(clock.frame, 3);
    }

    #[test]
    fn clock_never_goes_backwards() {
        let clock = FrameClock::default().advance(10.0).advance(-5.0);
        assert_eq!(clock.elapsed_ms, 10.0);
        assert_eq!(clock.frame, 2);
    }

    #[test]
    fn renderer_scales_with_ssaa() {
        let config = JsonConfig::default();
        let renderer = build_renderer(&config, 2);
        assert_eq!(renderer.framebuffer().width, 800);
        assert_eq!(renderer.framebuffer().height, 800);
        let renderer = build_renderer(&config, 0);
        assert_eq!(renderer.framebuffer().width, 400);
    }

    #[test]
    fn default_cube_inspects_consistently() {
        let scene = Scene::from_config(&JsonConfig::default(), None);
        assert!(inspect(&scene));
    }

    #[test]
    fn non_manifold_mesh_is_flagged() {
        use crate::json_struct::PassSchedule;
        use crate::vertex::Triangle;
        use cgmath::Vector3 as V;

        // a→b 有两个所属三角形，降序时查到的是第一个，升序时两条都会生成连接面
        let (a, b) = (V::new(0.0, 0.0, 0.0), V::new(1.0, 0.0, 0.0));
        let mesh = vec![
            Triangle::flat(a, b, V::new(0.0, 1.0, 0.0)),
            Triangle::flat(a, b, V::new(0.0, 0.0, 1.0)),
            Triangle::flat(b, a, V::new(0.0, -1.0, 0.0)),
        ];
        let scene = Scene::new(mesh, Vec::new(), PassSchedule::PerInstance);
        assert!(!inspect(&scene));
    }

    #[test]
    fn frame_paths_are_numbered() {
        let p = frame_path(Path::new("out"), "frame", 7);
        assert_eq!(p, Path::new("out").join("frame_007.png"));
    }
}
