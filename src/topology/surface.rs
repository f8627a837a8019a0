//! Facet-level queries on the mesh of a surface.
//!
//! Positions inside a facet are "local vertex" indices `lv` in
//! `0..nb_vertices_in_facet(f)`; the edge at position `e` joins `e` to
//! `next_in_facet(e)`.

use crate::error::{OperationError, Result};
use crate::math::{triangle_area, Point3, Vector3};
use crate::mesh::NO_ADJACENT;

use super::mesh_entity::MeshComponent;
use super::entity_id::NO_ID;

/// Where a walk along a surface border continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderStep {
    /// Facet holding the next border edge.
    pub facet: usize,
    /// Position of the shared vertex in `facet`.
    pub vertex_in_facet: usize,
    /// Position in `facet` of the next vertex on the border.
    pub next_in_facet: usize,
}

/// Whether edge `(a0, a1)` joins the same two vertices as `(b0, b1)`.
fn same_edge(a0: usize, a1: usize, b0: usize, b1: usize) -> bool {
    (a0 == b0 && a1 == b1) || (a0 == b1 && a1 == b0)
}

impl MeshComponent {
    /// Model vertex at position `lv` of facet `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` or `lv` is out of range.
    pub fn facet_model_vertex_id(&self, f: usize, lv: usize) -> Result<usize> {
        Ok(self.model_vertex_id(self.mesh().facet_vertex(f, lv)?))
    }

    /// First facet with an edge joining local vertices `v0` and `v1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet storage is inconsistent.
    pub fn facet_from_surface_vertex_ids(&self, v0: usize, v1: usize) -> Result<Option<usize>> {
        let mesh = self.mesh();
        for f in 0..mesh.nb_facets() {
            let vertices = mesh.facet_vertices(f)?;
            let Some(&last) = vertices.last() else {
                continue;
            };
            let mut prev = last;
            for &v in vertices {
                if same_edge(prev, v, v0, v1) {
                    return Ok(Some(f));
                }
                prev = v;
            }
        }
        Ok(None)
    }

    /// Position of the edge of facet `f` joining model vertices `g0` and `g1`,
    /// in either order.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn edge_in_facet_from_model_vertex_ids(
        &self,
        f: usize,
        g0: usize,
        g1: usize,
    ) -> Result<Option<usize>> {
        let mesh = self.mesh();
        for v in 0..mesh.nb_vertices_in_facet(f)? {
            let prev = mesh.prev_in_facet(f, v)?;
            let g_prev = self.facet_model_vertex_id(f, prev)?;
            let g = self.facet_model_vertex_id(f, v)?;
            if same_edge(g_prev, g, g0, g1) {
                return Ok(Some(prev));
            }
        }
        Ok(None)
    }

    /// First `(facet, edge)` joining model vertices `g0` and `g1`, in either order.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet storage is inconsistent.
    pub fn edge_from_model_vertex_ids(&self, g0: usize, g1: usize) -> Result<Option<(usize, usize)>> {
        for f in 0..self.mesh().nb_facets() {
            if let Some(e) = self.edge_in_facet_from_model_vertex_ids(f, g0, g1)? {
                return Ok(Some((f, e)));
            }
        }
        Ok(None)
    }

    /// First `(facet, edge)` going from model vertex `g0` to model vertex `g1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet storage is inconsistent.
    pub fn oriented_edge_from_model_vertex_ids(
        &self,
        g0: usize,
        g1: usize,
    ) -> Result<Option<(usize, usize)>> {
        let mesh = self.mesh();
        for f in 0..mesh.nb_facets() {
            for v in 0..mesh.nb_vertices_in_facet(f)? {
                let next = mesh.next_in_facet(f, v)?;
                if self.facet_model_vertex_id(f, v)? == g0
                    && self.facet_model_vertex_id(f, next)? == g1
                {
                    return Ok(Some((f, v)));
                }
            }
        }
        Ok(None)
    }

    /// Position of local vertex `v` in facet `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn facet_vertex_id(&self, f: usize, v: usize) -> Result<Option<usize>> {
        Ok(self.mesh().facet_vertices(f)?.iter().position(|&x| x == v))
    }

    /// Position in facet `f` of the vertex bound to model vertex `g`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn facet_id_from_model(&self, f: usize, g: usize) -> Result<Option<usize>> {
        Ok(self
            .mesh()
            .facet_vertices(f)?
            .iter()
            .position(|&x| self.model_vertex_id(x) == g))
    }

    /// Facets containing local vertex `v`, reached through facet adjacencies
    /// from `start` (or from the first facet containing `v`).
    ///
    /// With `border_only`, only facets with a border edge at `v` are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is out of range.
    pub fn facets_around_vertex(
        &self,
        v: usize,
        border_only: bool,
        start: Option<usize>,
    ) -> Result<Vec<usize>> {
        let mesh = self.mesh();
        let start = match start {
            Some(f) => f,
            None => {
                let mut found = None;
                for f in 0..mesh.nb_facets() {
                    if mesh.facet_vertices(f)?.contains(&v) {
                        found = Some(f);
                        break;
                    }
                }
                match found {
                    Some(f) => f,
                    None => return Ok(Vec::new()),
                }
            }
        };

        let mut result = Vec::new();
        let mut visited = vec![start];
        let mut stack = vec![start];

        while let Some(t) = stack.pop() {
            let Some(lv) = self.facet_vertex_id(t, v)? else {
                continue;
            };
            let adj_next = mesh.adjacent(t, lv)?;
            let adj_prev = mesh.adjacent(t, mesh.prev_in_facet(t, lv)?)?;

            for adj in [adj_next, adj_prev] {
                if adj != NO_ADJACENT && !visited.contains(&adj) {
                    visited.push(adj);
                    stack.push(adj);
                }
            }

            if !border_only || adj_next == NO_ADJACENT || adj_prev == NO_ADJACENT {
                result.push(t);
            }
        }
        Ok(result)
    }

    /// Next step of a walk along the border.
    ///
    /// The walk arrived in facet `f` along the border edge between positions
    /// `from` and `v`; the result gives the facet and positions of the border
    /// edge leaving the vertex at `v`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::AmbiguousTraversal`] if the border does not
    /// continue uniquely at that vertex.
    pub fn next_on_border(&self, f: usize, from: usize, v: usize) -> Result<BorderStep> {
        let mesh = self.mesh();
        let shared = mesh.facet_vertex(f, v)?;
        let facets = self.facets_around_vertex(shared, true, Some(f))?;

        match facets[..] {
            [single] if single == f => {
                // Both border edges at the vertex belong to f.
                let prev = mesh.prev_in_facet(f, v)?;
                let next_in_facet = if prev == from {
                    mesh.next_in_facet(f, v)?
                } else {
                    prev
                };
                Ok(BorderStep {
                    facet: f,
                    vertex_in_facet: v,
                    next_in_facet,
                })
            }
            [a, b] if a == f || b == f => {
                let next_f = if a == f { b } else { a };
                let v_in_next = self.facet_vertex_id(next_f, shared)?.ok_or_else(|| {
                    OperationError::AmbiguousTraversal(format!(
                        "facet {next_f} does not contain vertex {shared}"
                    ))
                })?;
                let prev_in_next = mesh.prev_in_facet(next_f, v_in_next)?;
                let e0_on_border = mesh.is_on_border(next_f, v_in_next)?;
                let e1_on_border = mesh.is_on_border(next_f, prev_in_next)?;
                if e0_on_border == e1_on_border {
                    return Err(OperationError::AmbiguousTraversal(format!(
                        "vertex {shared} has {} border edges in facet {next_f}",
                        if e0_on_border { 2 } else { 0 }
                    ))
                    .into());
                }
                let next_in_facet = if e0_on_border {
                    mesh.next_in_facet(next_f, v_in_next)?
                } else {
                    prev_in_next
                };
                Ok(BorderStep {
                    facet: next_f,
                    vertex_in_facet: v_in_next,
                    next_in_facet,
                })
            }
            _ => Err(OperationError::AmbiguousTraversal(format!(
                "vertex {shared} is in {} border facets around facet {f}",
                facets.len()
            ))
            .into()),
        }
    }

    /// Whether facets `f1` and `f2` are the same, neighbors, or share a
    /// border edge joining the same model vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if a facet is out of range.
    pub fn facets_are_adjacent(&self, f1: usize, f2: usize) -> Result<bool> {
        if f1 == f2 {
            return Ok(true);
        }
        let mesh = self.mesh();
        for v in 0..mesh.nb_vertices_in_facet(f1)? {
            let adj = mesh.adjacent(f1, v)?;
            if adj == f2 {
                return Ok(true);
            }
            if adj != NO_ADJACENT {
                continue;
            }
            let p0 = self.facet_model_vertex_id(f1, v)?;
            let p1 = self.facet_model_vertex_id(f1, mesh.next_in_facet(f1, v)?)?;
            for v2 in 0..mesh.nb_vertices_in_facet(f2)? {
                if !mesh.is_on_border(f2, v2)? {
                    continue;
                }
                let q0 = self.facet_model_vertex_id(f2, v2)?;
                let q1 = self.facet_model_vertex_id(f2, mesh.next_in_facet(f2, v2)?)?;
                if same_edge(p0, p1, q0, q1) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Mean of the vertices of facet `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn facet_barycenter(&self, f: usize) -> Result<Point3> {
        let vertices = self.mesh().facet_vertices(f)?;
        let mut sum = Vector3::zeros();
        for &v in vertices {
            sum += self.vertex(v)?.coords;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = vertices.len() as f64;
        Ok(Point3::from(sum / n))
    }

    /// Area of facet `f`, summed over the fan from its first vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn facet_area(&self, f: usize) -> Result<f64> {
        let vertices = self.mesh().facet_vertices(f)?;
        let p0 = self.vertex(vertices[0])?;
        let mut area = 0.0;
        for w in vertices[1..].windows(2) {
            area += triangle_area(p0, self.vertex(w[0])?, self.vertex(w[1])?);
        }
        Ok(area)
    }

    /// Unit normal of the plane through the first three vertices of facet `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn facet_normal(&self, f: usize) -> Result<Vector3> {
        let vertices = self.mesh().facet_vertices(f)?;
        let p0 = self.vertex(vertices[0])?;
        let p1 = self.vertex(vertices[1])?;
        let p2 = self.vertex(vertices[2])?;
        Ok((p1 - p0)
            .cross(&(p2 - p0))
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros))
    }

    /// Position in facet `f` of the vertex closest to `point`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn closest_vertex_in_facet(&self, f: usize, point: &Point3) -> Result<usize> {
        let mut best = 0;
        let mut best_dist = f64::MAX;
        for (lv, &v) in self.mesh().facet_vertices(f)?.iter().enumerate() {
            let dist = (point - self.vertex(v)?).norm_squared();
            if dist < best_dist {
                best_dist = dist;
                best = lv;
            }
        }
        Ok(best)
    }

    /// Whether facet `f` repeats a local vertex or a model vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn is_facet_degenerate(&self, f: usize) -> Result<bool> {
        let mut local = self.mesh().facet_vertices(f)?.to_vec();
        let mut global: Vec<usize> = local
            .iter()
            .map(|&v| self.model_vertex_id(v))
            .filter(|&g| g != NO_ID)
            .collect();
        local.sort_unstable();
        global.sort_unstable();
        let repeats = |ids: &[usize]| ids.windows(2).any(|w| w[0] == w[1]);
        Ok(repeats(&local) || repeats(&global))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// 3x2 grid of unit quads; vertex (i, j) is `j * 4 + i`, bound to the
    /// model vertex with the same index.
    fn grid() -> MeshComponent {
        let mut surface = MeshComponent::new();
        for j in 0..3u32 {
            for i in 0..4u32 {
                let index = usize::try_from(j * 4 + i).unwrap();
                surface.create_vertex(p(f64::from(i), f64::from(j), 0.0), index);
            }
        }
        let v = |i: usize, j: usize| j * 4 + i;
        for j in 0..2 {
            for i in 0..3 {
                surface
                    .mesh_mut()
                    .create_polygon(&[v(i, j), v(i + 1, j), v(i + 1, j + 1), v(i, j + 1)])
                    .unwrap();
            }
        }
        surface.mesh_mut().connect_facets();
        surface
    }

    #[test]
    fn edge_lookups_by_model_vertex() {
        let surface = grid();
        // Edge (0,1)-(1,1) = model vertices 4 and 5: facet 0 (upper edge) first.
        assert_eq!(surface.edge_from_model_vertex_ids(5, 4).unwrap(), Some((0, 2)));
        assert_eq!(
            surface.oriented_edge_from_model_vertex_ids(4, 5).unwrap(),
            Some((3, 0))
        );
        assert_eq!(surface.edge_from_model_vertex_ids(0, 5).unwrap(), None);
        assert_eq!(surface.facet_from_surface_vertex_ids(1, 5).unwrap(), Some(0));
    }

    #[test]
    fn facets_around_interior_and_border_vertices() {
        let surface = grid();
        let mut around = surface.facets_around_vertex(5, false, None).unwrap();
        around.sort_unstable();
        assert_eq!(around, vec![0, 1, 3, 4]);
        assert!(surface.facets_around_vertex(5, true, None).unwrap().is_empty());

        let mut border = surface.facets_around_vertex(1, true, None).unwrap();
        border.sort_unstable();
        assert_eq!(border, vec![0, 1]);
    }

    #[test]
    fn next_on_border_turns_at_grid_corner() {
        let surface = grid();
        // Facet 0 = [0, 1, 5, 4]; walking 4 -> 0 along the left border,
        // the border continues to vertex 1 inside the same facet.
        let step = surface.next_on_border(0, 3, 0).unwrap();
        assert_eq!(
            step,
            BorderStep {
                facet: 0,
                vertex_in_facet: 0,
                next_in_facet: 1
            }
        );
    }

    #[test]
    fn next_on_border_moves_to_neighbor_facet() {
        let surface = grid();
        // Walking 0 -> 1 along the bottom border of facet 0 continues in facet 1.
        let step = surface.next_on_border(0, 0, 1).unwrap();
        assert_eq!(step.facet, 1);
        assert_eq!(surface.mesh().facet_vertex(1, step.next_in_facet).unwrap(), 2);
    }

    #[test]
    fn next_on_border_rejects_interior_vertex() {
        let surface = grid();
        // Vertex 5 (position 2 in facet 0) is not on the border.
        let err = surface.next_on_border(0, 1, 2).unwrap_err();
        assert!(matches!(
            err,
            crate::GeoRepError::Operation(OperationError::AmbiguousTraversal(_))
        ));
    }

    #[test]
    fn adjacency_matches_border_edges_in_either_order() {
        let mut surface = grid();
        assert!(surface.facets_are_adjacent(0, 1).unwrap());
        assert!(!surface.facets_are_adjacent(0, 2).unwrap());

        // Sever facets 0 and 1: their shared edge is now a border edge on
        // both sides and still matches through the model vertices.
        surface.mesh_mut().set_adjacent(0, 1, NO_ADJACENT).unwrap();
        surface.mesh_mut().set_adjacent(1, 3, NO_ADJACENT).unwrap();
        assert!(surface.facets_are_adjacent(1, 0).unwrap());
        assert!(!surface.facets_are_adjacent(0, 4).unwrap());
    }

    #[test]
    fn facet_geometry() {
        let surface = grid();
        assert_relative_eq!(surface.facet_area(0).unwrap(), 1.0);
        assert_eq!(surface.facet_barycenter(4).unwrap(), p(1.5, 1.5, 0.0));
        assert_relative_eq!(surface.facet_normal(0).unwrap().z, 1.0);
        assert_eq!(
            surface
                .closest_vertex_in_facet(0, &p(0.9, 0.9, 0.0))
                .unwrap(),
            2
        );
        assert!(!surface.is_facet_degenerate(0).unwrap());
    }

    #[test]
    fn vertex_lookups_and_normals() {
        let surface = grid();
        // Facet 4 = [5, 6, 10, 9].
        assert_eq!(surface.facet_id_from_model(4, 9).unwrap(), Some(3));
        assert_eq!(surface.facet_id_from_model(4, 0).unwrap(), None);
        assert_eq!(surface.facet_vertex_id(4, 6).unwrap(), Some(1));
        for normal in surface.vertex_normals().unwrap() {
            assert_relative_eq!(normal, Vector3::z());
        }
    }

    #[test]
    fn repeated_model_vertex_is_degenerate() {
        let mut surface = grid();
        surface.set_model_vertex_id(5, 4);
        assert!(surface.is_facet_degenerate(0).unwrap());
    }
}
