use std::collections::HashMap;
use std::collections::hash_map::Entry;

use cgmath::Vector3 as Vec3;

use crate::geometry::{Mesh, split_quad};
use crate::vertex::{Triangle, Vertex};

/// 有向边：起点、终点，以及所属三角形的法线
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectedEdge {
    pub start: Vec3<f32>,
    pub end: Vec3<f32>,
    pub normal: Vec3<f32>,
}

type PositionKey = [u32; 3];
type EdgeKey = (PositionKey, PositionKey);

// 精确浮点相等；+0.0 与 -0.0 视为同一位置
fn position_key(p: Vec3<f32>) -> PositionKey {
    [p.x + 0.0, p.y + 0.0, p.z + 0.0].map(f32::to_bits)
}

fn edge_key(start: Vec3<f32>, end: Vec3<f32>) -> EdgeKey {
    (position_key(start), position_key(end))
}

// (x, y, z) 元组字典序
fn lex_less(a: Vec3<f32>, b: Vec3<f32>) -> bool {
    [a.x, a.y, a.z] < [b.x, b.y, b.z]
}

/// 每条无向边只访问一次时选用的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeOrdering {
    #[default]
    Ascending,
    Descending,
}

impl EdgeOrdering {
    fn is_canonical(self, start: Vec3<f32>, end: Vec3<f32>) -> bool {
        match self {
            EdgeOrdering::Ascending => lex_less(start, end),
            EdgeOrdering::Descending => lex_less(end, start),
        }
    }
}

/// 网格中所有有向边，按三角形顺序展开
pub fn directed_edges(mesh: &[Triangle]) -> Vec<DirectedEdge> {
    mesh.iter()
        .flat_map(|tri| {
            // 平面三角形三个顶点法线一致，取第一个即可
            let normal = tri.vertices[0].normal;
            tri.edges().map(|(start, end)| DirectedEdge { start, end, normal })
        })
        .collect()
}

/// 有向边 → 所属三角形法线
///
/// 非流形网格中同一有向边可能出现多次，保留插入顺序中的第一个。
#[derive(Debug, Default)]
pub struct EdgeMap {
    owners: HashMap<EdgeKey, Vec3<f32>>,
    duplicates: usize,
}

impl EdgeMap {
    pub fn build(edges: &[DirectedEdge]) -> Self {
        let mut map = EdgeMap::default();
        for edge in edges {
            match map.owners.entry(edge_key(edge.start, edge.end)) {
                Entry::Vacant(slot) => {
                    slot.insert(edge.normal);
                }
                Entry::Occupied(_) => map.duplicates += 1,
            }
        }
        map
    }

    pub fn owner_normal(&self, start: Vec3<f32>, end: Vec3<f32>) -> Option<Vec3<f32>> {
        self.owners.get(&edge_key(start, end)).copied()
    }

    /// 去重后的有向边数量
    pub fn unique_edges(&self) -> usize {
        self.owners.len()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// 连接面：沿共享边把两侧三角形的法线连起来
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlueQuad {
    pub vertices: [Vertex; 4],
}

impl GlueQuad {
    /// 边 (a, b) 属于法线 n1 的三角形，反向边 (b, a) 属于法线 n2 的三角形
    pub fn across(a: Vec3<f32>, b: Vec3<f32>, n1: Vec3<f32>, n2: Vec3<f32>) -> Self {
        Self {
            vertices: [
                Vertex::new(b, n1),
                Vertex::new(a, n1),
                Vertex::new(a, n2),
                Vertex::new(b, n2),
            ],
        }
    }

    pub fn triangles(&self) -> [Triangle; 2] {
        split_quad(self.vertices)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowVolumeStats {
    pub base_triangles: usize,
    pub directed_edges: usize,
    pub unique_edges: usize,
    pub glue_quads: usize,
    /// 找不到反向边的有向边（开放网格的边界）
    pub boundary_edges: usize,
    /// 重复出现的有向边（非流形）
    pub duplicate_edges: usize,
}

#[derive(Debug, Clone)]
pub struct ShadowVolume {
    /// 原始三角形 + 所有连接面三角形
    pub triangles: Mesh,
    pub glue_quads: Vec<GlueQuad>,
    pub stats: ShadowVolumeStats,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowVolumeBuilder {
    pub ordering: EdgeOrdering,
}

impl ShadowVolumeBuilder {
    pub fn new(ordering: EdgeOrdering) -> Self {
        Self { ordering }
    }

    pub fn build(&self, base: &[Triangle]) -> ShadowVolume {
        let edges = directed_edges(base);
        let map = EdgeMap::build(&edges);

        let mut glue_quads = Vec::new();
        let mut boundary_edges = 0;
        for edge in &edges {
            let reverse = map.owner_normal(edge.end, edge.start);
            if reverse.is_none() {
                boundary_edges += 1;
            }
            if !self.ordering.is_canonical(edge.start, edge.end) {
                continue;
            }
            // 边界边没有对应的三角形，直接跳过（开放网格不补封口）
            if let Some(n2) = reverse {
                glue_quads.push(GlueQuad::across(edge.start, edge.end, edge.normal, n2));
            }
        }

        if boundary_edges > 0 {
            log::debug!("shadow volume: {boundary_edges} boundary edges skipped");
        }
        if map.duplicates() > 0 {
            log::warn!(
                "shadow volume: {} duplicated directed edges, keeping first owner",
                map.duplicates()
            );
        }

        let mut triangles = Vec::with_capacity(base.len() + glue_quads.len() * 2);
        triangles.extend_from_slice(base);
        triangles.extend(glue_quads.iter().flat_map(GlueQuad::triangles));

        ShadowVolume {
            stats: ShadowVolumeStats {
                base_triangles: base.len(),
                directed_edges: edges.len(),
                unique_edges: map.unique_edges(),
                glue_quads: glue_quads.len(),
                boundary_edges,
                duplicate_edges: map.duplicates(),
            },
            triangles,
            glue_quads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::cube;

    fn sorted_edge(a: Vec3<f32>, b: Vec3<f32>) -> [f32; 6] {
        if lex_less(a, b) {
            [a.x, a.y, a.z, b.x, b.y, b.z]
        } else {
            [b.x, b.y, b.z, a.x, a.y, a.z]
        }
    }

    fn quad_edges(quads: &[GlueQuad]) -> Vec<[f32; 6]> {
        let mut edges: Vec<[f32; 6]> = quads
            .iter()
            .map(|q| sorted_edge(q.vertices[0].pos, q.vertices[1].pos))
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap());
        edges
    }

    #[test]
    fn cube_every_directed_edge_has_one_partner() {
        let mesh = cube(1.0);
        let edges = directed_edges(&mesh);
        assert_eq!(edges.len(), 36);

        let map = EdgeMap::build(&edges);
        assert_eq!(map.unique_edges(), 36);
        assert_eq!(map.duplicates(), 0);
        for e in &edges {
            assert!(map.owner_normal(e.end, e.start).is_some());
        }
    }

    #[test]
    fn cube_shadow_volume_counts() {
        let mesh = cube(1.0);
        let volume = ShadowVolumeBuilder::default().build(&mesh);

        // 12 条棱 + 6 条面对角线，每条无向边一个连接面
        assert_eq!(volume.glue_quads.len(), 18);
        assert_eq!(volume.triangles.len(), 12 + 18 * 2);
        assert_eq!(volume.stats.boundary_edges, 0);
        assert_eq!(volume.stats.duplicate_edges, 0);
        assert_eq!(volume.stats.unique_edges, 36);
        assert_eq!(&volume.triangles[..12], &mesh[..]);
    }

    #[test]
    fn glue_quads_sit_on_shared_edges() {
        let mesh = cube(1.0);
        let volume = ShadowVolumeBuilder::default().build(&mesh);

        for quad in &volume.glue_quads {
            let [v0, v1, v2, v3] = quad.vertices;
            let (a, b) = (v1.pos, v0.pos);
            assert_eq!(v2.pos, a);
            assert_eq!(v3.pos, b);

            let owner = mesh
                .iter()
                .find(|t| t.edges().contains(&(a, b)))
                .expect("edge owner");
            let neighbour = mesh
                .iter()
                .find(|t| t.edges().contains(&(b, a)))
                .expect("reverse edge owner");
            assert_eq!(v0.normal, owner.vertices[0].normal);
            assert_eq!(v1.normal, owner.vertices[0].normal);
            assert_eq!(v2.normal, neighbour.vertices[0].normal);
            assert_eq!(v3.normal, neighbour.vertices[0].normal);
        }
    }

    #[test]
    fn reversed_ordering_builds_same_quads() {
        let mesh = cube(1.0);
        let asc = ShadowVolumeBuilder::new(EdgeOrdering::Ascending).build(&mesh);
        let desc = ShadowVolumeBuilder::new(EdgeOrdering::Descending).build(&mesh);

        assert_eq!(asc.triangles.len(), desc.triangles.len());
        assert_eq!(quad_edges(&asc.glue_quads), quad_edges(&desc.glue_quads));
    }

    #[test]
    fn single_triangle_has_no_glue() {
        let mesh = vec![Triangle::flat(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )];
        let volume = ShadowVolumeBuilder::default().build(&mesh);

        assert!(volume.glue_quads.is_empty());
        assert_eq!(volume.triangles, mesh);
        assert_eq!(volume.stats.boundary_edges, 3);
    }

    #[test]
    fn open_box_skips_boundary_edges() {
        // 去掉 +Y 面的两个三角形，顶部四条棱成为边界
        let mut mesh = cube(1.0);
        mesh.drain(4..6);
        let volume = ShadowVolumeBuilder::default().build(&mesh);

        assert_eq!(volume.stats.boundary_edges, 4);
        // 18 条无向边 - 4 条边界棱 - 1 条被删掉的对角线
        assert_eq!(volume.glue_quads.len(), 13);
    }

    #[test]
    fn negative_zero_matches_positive_zero() {
        let n = Vec3::new(0.0, 0.0, 1.0);
        let edges = [
            DirectedEdge {
                start: Vec3::new(0.0, 0.0, 0.0),
                end: Vec3::new(1.0, 0.0, 0.0),
                normal: n,
            },
            DirectedEdge {
                start: Vec3::new(1.0, -0.0, 0.0),
                end: Vec3::new(-0.0, 0.0, -0.0),
                normal: -n,
            },
        ];
        let map = EdgeMap::build(&edges);
        assert_eq!(map.owner_normal(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0)), Some(-n));
    }

    #[test]
    fn nearly_equal_positions_do_not_match() {
        let tri_a = Triangle::flat(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let tri_b = Triangle::flat(
            Vec3::new(1.0 + 1e-6, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
        );
        let volume = ShadowVolumeBuilder::default().build(&[tri_a, tri_b]);
        assert!(volume.glue_quads.is_empty());
    }

    #[test]
    fn duplicate_edges_keep_first_owner() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let first = Triangle::flat(a, b, Vec3::new(0.0, 1.0, 0.0));
        let second = Triangle::flat(a, b, Vec3::new(0.0, 0.0, 1.0));
        let reverse = Triangle::flat(b, a, Vec3::new(0.0, -1.0, 0.0));

        // 降序时由 b→a 去查 a→b，两个候选里只取第一个
        let volume = ShadowVolumeBuilder::new(EdgeOrdering::Descending)
            .build(&[first, second, reverse]);
        assert_eq!(volume.stats.duplicate_edges, 1);

        let shared: Vec<_> = volume
            .glue_quads
            .iter()
            .filter(|q| q.vertices[0].pos == a && q.vertices[1].pos == b)
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].vertices[0].normal, reverse.vertices[0].normal);
        assert_eq!(shared[0].vertices[2].normal, first.vertices[0].normal);
    }

    #[test]
    fn build_is_deterministic() {
        let mesh = cube(0.75);
        let builder = ShadowVolumeBuilder::default();
        assert_eq!(builder.build(&mesh).triangles, builder.build(&mesh).triangles);
    }
}
