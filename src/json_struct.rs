use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use cgmath::{Deg, InnerSpace, Point3, Vector3 as Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::camera::{Camera, Frustum};
use crate::renderer::Light;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 场景配置，所有字段都有默认值，`{}` 就是默认场景
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct JsonConfig {
    pub viewport: ViewportConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: usize,
    pub height: usize,
    pub clear_color: [f32; 3],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            clear_color: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    /// 垂直视角（度）
    pub fovy: f32,
    pub near: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [4.5, 2.5, -7.0],
            target: [0.0, -0.5, 1.0],
            fovy: 45.0,
            near: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightConfig {
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub ambient: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [0.0, -0.2, 1.0],
            color: [0.8, 0.2, 0.2],
            ambient: [0.1, 0.1, 0.1],
        }
    }
}

/// 每个模型三遍绘制的排列方式
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PassSchedule {
    /// 每个模型依次执行 环境光 → 阴影体 → 直射光
    #[default]
    PerInstance,
    /// 先画所有模型的环境光，再画所有阴影体，最后画所有直射光
    PerPass,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub half_extent: f32,
    /// 旋转立方体绕 X 轴的固定倾角（弧度）
    pub tilt: f32,
    /// 静止立方体的平移
    pub static_offset: [f32; 3],
    pub schedule: PassSchedule,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            half_extent: 1.0,
            tilt: 0.4,
            static_offset: [0.5, -1.2, 3.0],
            schedule: PassSchedule::PerInstance,
        }
    }
}

impl JsonConfig {
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, ConfigError> {
        let config: JsonConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::Invalid("viewport must be non-empty".into()));
        }
        if Vec3::from(self.light.direction).magnitude2() == 0.0 {
            return Err(ConfigError::Invalid("light direction must be non-zero".into()));
        }
        if self.camera.near <= 0.0 {
            return Err(ConfigError::Invalid("camera near plane must be positive".into()));
        }
        if !(self.camera.fovy > 0.0 && self.camera.fovy < 180.0) {
            return Err(ConfigError::Invalid("camera fovy must be in (0, 180)".into()));
        }
        if self.scene.half_extent <= 0.0 {
            return Err(ConfigError::Invalid("cube half extent must be positive".into()));
        }
        Ok(())
    }

    pub fn light(&self) -> Light {
        Light::new(
            self.light.direction.into(),
            self.light.color.into(),
            self.light.ambient.into(),
        )
    }

    pub fn camera(&self) -> Camera {
        let aspect = self.viewport.width as f32 / self.viewport.height as f32;
        Camera::new(
            Frustum::new(self.camera.near, aspect, Deg(self.camera.fovy).into()),
            Point3::from(self.camera.eye),
            Point3::from(self.camera.target),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = JsonConfig::from_reader("{}".as_bytes()).expect("valid");
        assert_eq!(config, JsonConfig::default());
        assert_eq!((config.viewport.width, config.viewport.height), (400, 400));
        assert_eq!(config.scene.schedule, PassSchedule::PerInstance);
    }

    #[test]
    fn partial_override() {
        let json = r#"{
            "light": { "color": [1.0, 1.0, 1.0] },
            "scene": { "schedule": "per_pass", "tilt": 0.0 }
        }"#;
        let config = JsonConfig::from_reader(json.as_bytes()).expect("valid");
        assert_eq!(config.light.color, [1.0, 1.0, 1.0]);
        assert_eq!(config.light.ambient, [0.1, 0.1, 0.1]);
        assert_eq!(config.scene.schedule, PassSchedule::PerPass);
        assert_eq!(config.scene.tilt, 0.0);
        assert_eq!(config.scene.half_extent, 1.0);
    }

    #[test]
    fn light_direction_is_normalized() {
        let light = JsonConfig::default().light();
        assert!((light.direction.magnitude() - 1.0).abs() < 1e-6);
        assert!(light.direction.z > 0.9);
    }

    #[test]
    fn rejects_invalid_values() {
        let zero_light = r#"{ "light": { "direction": [0.0, 0.0, 0.0] } }"#;
        assert!(matches!(
            JsonConfig::from_reader(zero_light.as_bytes()),
            Err(ConfigError::Invalid(_))
        ));

        let empty_viewport = r#"{ "viewport": { "width": 0 } }"#;
        assert!(matches!(
            JsonConfig::from_reader(empty_viewport.as_bytes()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            JsonConfig::from_reader("{ not json".as_bytes()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_schedule_is_rejected() {
        let json = r#"{ "scene": { "schedule": "sometimes" } }"#;
        assert!(JsonConfig::from_reader(json.as_bytes()).is_err());
    }
}
