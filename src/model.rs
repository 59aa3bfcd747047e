use std::path::Path;

use cgmath::Vector3 as Vec3;
use obj::{Obj, ObjData};
use thiserror::Error;

use crate::geometry::Mesh;
use crate::vertex::Triangle;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load OBJ: {0}")]
    Load(#[from] obj::ObjError),
    #[error("face references vertex {index}, but only {count} positions exist")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("OBJ contains no faces")]
    Empty,
}

pub fn load_obj(path: &Path) -> Result<Mesh, ModelError> {
    let obj = Obj::load(path)?;
    let mesh = triangles_from_obj(&obj.data)?;
    log::info!("loaded {} triangles from {}", mesh.len(), path.display());
    Ok(mesh)
}

/// OBJ 面 → 平面三角形
///
/// OBJ 约定从外侧看逆时针，而面法线公式 (b - a) × (a - c) 要求相反的顺序，
/// 所以扇形三角化时把每个三角形的后两个顶点对调。
pub fn triangles_from_obj(data: &ObjData) -> Result<Mesh, ModelError> {
    let positions: Vec<Vec3<f32>> = data.position.iter().map(|&p| Vec3::from(p)).collect();
    let lookup = |index: usize| {
        positions
            .get(index)
            .copied()
            .ok_or(ModelError::IndexOutOfRange {
                index,
                count: positions.len(),
            })
    };

    let mut triangles = Vec::new();
    let mut skipped = 0;
    for object in &data.objects {
        for group in &object.groups {
            for poly in &group.polys {
                if poly.0.len() < 3 {
                    skipped += 1;
                    continue;
                }
                let first = lookup(poly.0[0].0)?;
                for pair in poly.0[1..].windows(2) {
                    let b = lookup(pair[0].0)?;
                    let c = lookup(pair[1].0)?;
                    triangles.push(Triangle::flat(first, c, b));
                }
            }
        }
    }

    if skipped > 0 {
        log::warn!("skipped {skipped} faces with fewer than three vertices");
    }
    if triangles.is_empty() {
        return Err(ModelError::Empty);
    }
    Ok(triangles)
}
