mod camera;
mod framebuffer;
mod geometry;
mod json_struct;
mod model;
mod rasterizer;
mod renderer;
mod run_app;
mod scene;
mod shadow_volume;
mod vertex;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::json_struct::JsonConfig;
use crate::run_app::ExportOptions;
use crate::scene::Scene;

#[derive(Parser, Debug)]
#[command(name = "rs-stencil-shadow", version, about = "Stencil shadow volume demo")]
struct Cli {
    /// JSON 场景配置，缺省时使用内置默认值
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// 用 OBJ 模型替换立方体
    #[arg(long, global = true)]
    mesh: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 打开窗口实时渲染（默认）
    Window,
    /// 离屏渲染若干帧到 PNG
    Export {
        #[arg(long, default_value_t = 60)]
        frames: usize,
        /// 相邻两帧之间的动画时间（毫秒）
        #[arg(long, default_value_t = 1000.0 / 30.0)]
        step_ms: f32,
        #[arg(long, default_value = "output")]
        out: PathBuf,
        #[arg(long, default_value_t = 1)]
        ssaa: usize,
        /// 同时输出深度和模板缓冲
        #[arg(long)]
        dump_buffers: bool,
    },
    /// 打印网格与阴影体统计
    Inspect,
}

fn init_logging() {
    let mut builder = env_logger::Builder::new();
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => JsonConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => JsonConfig::default(),
    };
    let mesh = match &cli.mesh {
        Some(path) => Some(
            model::load_obj(path).with_context(|| format!("failed to load mesh {}", path.display()))?,
        ),
        None => None,
    };

    let scene = Scene::from_config(&config, mesh);
    log::info!(
        "scene ready: {} base triangles, {} shadow volume triangles",
        scene.base().len(),
        scene.shadow().len()
    );

    match cli.command.unwrap_or(Command::Window) {
        Command::Window => run_app::run_window(&scene, &config)?,
        Command::Export {
            frames,
            step_ms,
            out,
            ssaa,
            dump_buffers,
        } => {
            let options = ExportOptions {
                frames,
                step_ms,
                out_dir: out,
                ssaa,
                dump_buffers,
            };
            let written = run_app::export_frames(&scene, &config, &options)?;
            log::info!("wrote {written} frames to {}", options.out_dir.display());
        }
        Command::Inspect => {
            if !run_app::inspect(&scene) {
                log::warn!("shadow volume depends on edge ordering, check the mesh");
            }
        }
    }
    Ok(())
}
