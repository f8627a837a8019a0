//! Reference models shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use crate::math::Point3;
use crate::operations::edit::SetUniverse;
use crate::topology::{EntityId, EntityType, GeoModel};

/// Installs a test subscriber honouring `RUST_LOG`; later calls are no-ops.
pub(crate) fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// Quads of the unit cube in local vertex numbering `x + 2y + 4z`, each
/// oriented with its normal pointing out of the cube.
const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 2, 3, 1],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 4, 6, 2],
    [1, 3, 7, 5],
];

fn cube_faces(vertex: impl Fn(usize, usize, usize) -> usize) -> Vec<[usize; 4]> {
    CUBE_FACES
        .iter()
        .map(|face| face.map(|l| vertex(l & 1, (l >> 1) & 1, (l >> 2) & 1)))
        .collect()
}

/// Builds a fully wired model from polyhedral regions.
///
/// Every point becomes a model vertex and a corner. A quad seen twice
/// becomes one surface shared by both regions; the second region sees it
/// with side `false`. Surfaces bounding a single region bound the universe.
pub(crate) fn polyhedra_model(name: &str, points: &[Point3], regions: &[Vec<[usize; 4]>]) -> GeoModel {
    let mut model = GeoModel::new(name);
    for (i, &point) in points.iter().enumerate() {
        let g = model.vertices_mut().add_vertex(point);
        let corner = model.create_element(EntityType::Corner).unwrap();
        assert_eq!(corner.index, i);
        model.set_vertices_from_model(corner, &[g], true).unwrap();
    }

    let mut lines: HashMap<(usize, usize), EntityId> = HashMap::new();
    let mut surfaces: HashMap<[usize; 4], EntityId> = HashMap::new();

    for face_list in regions {
        let region = model.create_element(EntityType::Region).unwrap();
        for face in face_list {
            let mut key = *face;
            key.sort_unstable();
            if let Some(&surface) = surfaces.get(&key) {
                model.add_boundary_relation(region, surface, false).unwrap();
                continue;
            }

            let surface = model.create_element(EntityType::Surface).unwrap();
            model
                .set_surface_geometry_from_model(surface, face, &[0, 1, 2, 3], &[0, 4])
                .unwrap();
            for k in 0..4 {
                let (a, b) = (face[k], face[(k + 1) % 4]);
                let line = match lines.get(&(a.min(b), a.max(b))) {
                    Some(&line) => line,
                    None => {
                        let line = model.create_element(EntityType::Line).unwrap();
                        model.set_vertices_from_model(line, &[a, b], true).unwrap();
                        model
                            .add_boundary_relation(line, EntityId::corner(a), true)
                            .unwrap();
                        model
                            .add_boundary_relation(line, EntityId::corner(b), true)
                            .unwrap();
                        lines.insert((a.min(b), a.max(b)), line);
                        line
                    }
                };
                model.add_boundary_relation(surface, line, true).unwrap();
            }
            surfaces.insert(key, surface);
            model.add_boundary_relation(region, surface, true).unwrap();
        }
    }

    let universe: Vec<(usize, bool)> = model
        .elements(EntityType::Surface)
        .iter()
        .filter(|s| s.nb_in_boundary() == 1)
        .map(|s| (s.id().index, true))
        .collect();
    SetUniverse::new(universe).execute(&mut model).unwrap();
    model
}

/// Unit cube: 1 region, 6 surfaces, 12 lines, 8 corners.
pub(crate) fn cube() -> GeoModel {
    let points: Vec<Point3> = (0..8u32)
        .map(|g| Point3::new(f64::from(g & 1), f64::from((g >> 1) & 1), f64::from((g >> 2) & 1)))
        .collect();
    let faces = cube_faces(|x, y, z| x + 2 * y + 4 * z);
    polyhedra_model("cube", &points, &[faces])
}

/// Cubes `[0, 1]^3` (region 0) and `[1, 2] x [0, 1]^2` (region 1) sharing
/// the face `x = 1`: 2 regions, 11 surfaces, 20 lines, 12 corners.
pub(crate) fn two_cubes() -> GeoModel {
    let mut points = Vec::new();
    for z in 0..2u32 {
        for y in 0..2u32 {
            for x in 0..3u32 {
                points.push(Point3::new(f64::from(x), f64::from(y), f64::from(z)));
            }
        }
    }
    let vertex = |x0: usize| move |x: usize, y: usize, z: usize| x0 + x + 3 * y + 6 * z;
    let regions = [cube_faces(vertex(0)), cube_faces(vertex(1))];
    polyhedra_model("two cubes", &points, &regions)
}

/// 3x2 grid of unit quads in surface 0, model vertex `(i, j)` = `j * 4 + i`,
/// crossed by line 0 through model vertices 4, 5 and 6 (`y = 1`, from
/// `x = 0` to `x = 2`). Corner 0 sits on vertex 4 and corner 1 on vertex 6.
pub(crate) fn grid_with_line() -> GeoModel {
    let mut model = GeoModel::new("grid");
    for j in 0..3u32 {
        for i in 0..4u32 {
            model
                .vertices_mut()
                .add_vertex(Point3::new(f64::from(i), f64::from(j), 0.0));
        }
    }

    let surface = model.create_element(EntityType::Surface).unwrap();
    let model_vertices: Vec<usize> = (0..12).collect();
    let v = |i: usize, j: usize| j * 4 + i;
    let mut facets = Vec::new();
    for j in 0..2 {
        for i in 0..3 {
            facets.extend([v(i, j), v(i + 1, j), v(i + 1, j + 1), v(i, j + 1)]);
        }
    }
    let facet_ptr: Vec<usize> = (0..=6).map(|f| f * 4).collect();
    model
        .set_surface_geometry_from_model(surface, &model_vertices, &facets, &facet_ptr)
        .unwrap();

    let c0 = model.create_element(EntityType::Corner).unwrap();
    let c1 = model.create_element(EntityType::Corner).unwrap();
    model.set_vertices_from_model(c0, &[4], true).unwrap();
    model.set_vertices_from_model(c1, &[6], true).unwrap();

    let line = model.create_element(EntityType::Line).unwrap();
    model.set_vertices_from_model(line, &[4, 5, 6], true).unwrap();
    model.add_boundary_relation(line, c0, true).unwrap();
    model.add_boundary_relation(line, c1, true).unwrap();
    model.add_boundary_relation(surface, line, true).unwrap();
    model
}
