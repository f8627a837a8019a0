//! Minimal indexed mesh storage used by every mesh-backed entity.
//!
//! Facets are polygons stored in a compressed row layout: the corners of
//! facet `f` are `facet_ptr[f]..facet_ptr[f + 1]`. Each corner also stores the
//! facet adjacent across the edge starting at that corner, or [`NO_ADJACENT`]
//! when that edge is on the border.

use std::collections::{HashMap, VecDeque};
use std::ops::Range;

use crate::error::MeshError;
use crate::math::Point3;

/// Marker for a facet edge that has no neighbor.
pub const NO_ADJACENT: usize = usize::MAX;

/// Vertices, edges, polygonal facets and cells of one entity.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Point3>,
    edges: Vec<[usize; 2]>,
    facet_ptr: Vec<usize>,
    facet_corners: Vec<usize>,
    corner_adjacent: Vec<usize>,
    cells: Vec<Vec<usize>>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            facet_ptr: vec![0],
            facet_corners: Vec::new(),
            corner_adjacent: Vec::new(),
            cells: Vec::new(),
        }
    }
}

impl Mesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every vertex, edge, facet and cell.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // --- Vertices ---

    #[must_use]
    pub fn nb_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Appends a vertex and returns its index.
    pub fn create_vertex(&mut self, point: Point3) -> usize {
        self.vertices.push(point);
        self.vertices.len() - 1
    }

    /// Appends `nb` vertices at the origin and returns the index of the first one.
    pub fn create_vertices(&mut self, nb: usize) -> usize {
        let first = self.vertices.len();
        self.vertices.resize(first + nb, Point3::origin());
        first
    }

    /// Coordinates of vertex `v`.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is out of range.
    pub fn point(&self, v: usize) -> Result<&Point3, MeshError> {
        self.vertices.get(v).ok_or(MeshError::VertexOutOfRange {
            index: v,
            count: self.vertices.len(),
        })
    }

    /// Moves vertex `v` to `point`.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is out of range.
    pub fn set_point(&mut self, v: usize, point: Point3) -> Result<(), MeshError> {
        let count = self.vertices.len();
        let slot = self
            .vertices
            .get_mut(v)
            .ok_or(MeshError::VertexOutOfRange { index: v, count })?;
        *slot = point;
        Ok(())
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.vertices
    }

    // --- Edges ---

    #[must_use]
    pub fn nb_edges(&self) -> usize {
        self.edges.len()
    }

    /// Appends the edge `(v0, v1)` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the vertices does not exist.
    pub fn create_edge(&mut self, v0: usize, v1: usize) -> Result<usize, MeshError> {
        self.check_vertex(v0)?;
        self.check_vertex(v1)?;
        self.edges.push([v0, v1]);
        Ok(self.edges.len() - 1)
    }

    /// The two vertices of edge `e`.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is out of range.
    pub fn edge_vertices(&self, e: usize) -> Result<[usize; 2], MeshError> {
        self.edges.get(e).copied().ok_or(MeshError::EdgeOutOfRange {
            index: e,
            count: self.edges.len(),
        })
    }

    // --- Facets ---

    #[must_use]
    pub fn nb_facets(&self) -> usize {
        self.facet_ptr.len() - 1
    }

    /// Appends a polygon and returns its index. Its edges start on the border.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon has fewer than 3 vertices or refers to
    /// a missing vertex.
    pub fn create_polygon(&mut self, vertices: &[usize]) -> Result<usize, MeshError> {
        if vertices.len() < 3 {
            return Err(MeshError::InvalidFacet(format!(
                "a polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        for &v in vertices {
            self.check_vertex(v)?;
        }
        self.facet_corners.extend_from_slice(vertices);
        self.corner_adjacent
            .extend(std::iter::repeat_n(NO_ADJACENT, vertices.len()));
        self.facet_ptr.push(self.facet_corners.len());
        Ok(self.nb_facets() - 1)
    }

    /// Corner range of facet `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn facet_corners(&self, f: usize) -> Result<Range<usize>, MeshError> {
        if f >= self.nb_facets() {
            return Err(MeshError::FacetOutOfRange {
                index: f,
                count: self.nb_facets(),
            });
        }
        Ok(self.facet_ptr[f]..self.facet_ptr[f + 1])
    }

    /// Vertices of facet `f`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn facet_vertices(&self, f: usize) -> Result<&[usize], MeshError> {
        let range = self.facet_corners(f)?;
        Ok(&self.facet_corners[range])
    }

    /// Number of vertices of facet `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn nb_vertices_in_facet(&self, f: usize) -> Result<usize, MeshError> {
        Ok(self.facet_corners(f)?.len())
    }

    /// Mesh vertex at position `lv` of facet `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` or `lv` is out of range.
    pub fn facet_vertex(&self, f: usize, lv: usize) -> Result<usize, MeshError> {
        let corner = self.corner(f, lv)?;
        Ok(self.facet_corners[corner])
    }

    /// Replaces the mesh vertex at position `lv` of facet `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f`, `lv` or `v` is out of range.
    pub fn set_facet_vertex(&mut self, f: usize, lv: usize, v: usize) -> Result<(), MeshError> {
        self.check_vertex(v)?;
        let corner = self.corner(f, lv)?;
        self.facet_corners[corner] = v;
        Ok(())
    }

    /// Position in facet `f` following `lv`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn next_in_facet(&self, f: usize, lv: usize) -> Result<usize, MeshError> {
        let n = self.nb_vertices_in_facet(f)?;
        Ok((lv + 1) % n)
    }

    /// Position in facet `f` preceding `lv`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is out of range.
    pub fn prev_in_facet(&self, f: usize, lv: usize) -> Result<usize, MeshError> {
        let n = self.nb_vertices_in_facet(f)?;
        Ok((lv + n - 1) % n)
    }

    /// Facet adjacent to `f` across the edge starting at position `e`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` or `e` is out of range.
    pub fn adjacent(&self, f: usize, e: usize) -> Result<usize, MeshError> {
        let corner = self.corner(f, e)?;
        Ok(self.corner_adjacent[corner])
    }

    /// Sets the facet adjacent to `f` across the edge starting at position `e`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` or `e` is out of range.
    pub fn set_adjacent(&mut self, f: usize, e: usize, adjacent: usize) -> Result<(), MeshError> {
        let corner = self.corner(f, e)?;
        self.corner_adjacent[corner] = adjacent;
        Ok(())
    }

    /// Whether the edge starting at position `e` of facet `f` has no neighbor.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` or `e` is out of range.
    pub fn is_on_border(&self, f: usize, e: usize) -> Result<bool, MeshError> {
        Ok(self.adjacent(f, e)? == NO_ADJACENT)
    }

    /// Recomputes facet adjacencies from shared vertex indices.
    ///
    /// Two facet edges are glued when they join the same two vertices, in
    /// either order, and no other facet edge does. Non-manifold edges stay on
    /// the border.
    pub fn connect_facets(&mut self) {
        let mut edge_map: HashMap<(usize, usize), Vec<(usize, usize)>> = HashMap::new();
        for f in 0..self.nb_facets() {
            let start = self.facet_ptr[f];
            let n = self.facet_ptr[f + 1] - start;
            for e in 0..n {
                let v0 = self.facet_corners[start + e];
                let v1 = self.facet_corners[start + (e + 1) % n];
                edge_map
                    .entry((v0.min(v1), v0.max(v1)))
                    .or_default()
                    .push((f, e));
            }
        }

        self.corner_adjacent.fill(NO_ADJACENT);
        for sharing in edge_map.values() {
            if let [(f0, e0), (f1, e1)] = sharing[..] {
                if f0 != f1 {
                    self.corner_adjacent[self.facet_ptr[f0] + e0] = f1;
                    self.corner_adjacent[self.facet_ptr[f1] + e1] = f0;
                }
            }
        }
    }

    /// Number of connected components of the facet adjacency graph.
    #[must_use]
    pub fn nb_facet_components(&self) -> usize {
        let n = self.nb_facets();
        let mut visited = vec![false; n];
        let mut components = 0;

        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            components += 1;
            let mut queue = VecDeque::new();
            queue.push_back(start);

            while let Some(f) = queue.pop_front() {
                for corner in self.facet_ptr[f]..self.facet_ptr[f + 1] {
                    let adj = self.corner_adjacent[corner];
                    if adj != NO_ADJACENT && !visited[adj] {
                        visited[adj] = true;
                        queue.push_back(adj);
                    }
                }
            }
        }
        components
    }

    /// Number of edges and facet corners referring to each vertex.
    #[must_use]
    pub fn vertex_incidences(&self) -> Vec<usize> {
        let mut counts = vec![0; self.nb_vertices()];
        for &[v0, v1] in &self.edges {
            counts[v0] += 1;
            counts[v1] += 1;
        }
        for &v in &self.facet_corners {
            counts[v] += 1;
        }
        for cell in &self.cells {
            for &v in cell {
                counts[v] += 1;
            }
        }
        counts
    }

    // --- Cells ---

    #[must_use]
    pub fn nb_cells(&self) -> usize {
        self.cells.len()
    }

    /// Appends a volumetric cell given by its vertices and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell refers to a missing vertex.
    pub fn create_cell(&mut self, vertices: &[usize]) -> Result<usize, MeshError> {
        for &v in vertices {
            self.check_vertex(v)?;
        }
        self.cells.push(vertices.to_vec());
        Ok(self.cells.len() - 1)
    }

    /// Vertices of cell `c`.
    #[must_use]
    pub fn cell_vertices(&self, c: usize) -> Option<&[usize]> {
        self.cells.get(c).map(Vec::as_slice)
    }

    fn check_vertex(&self, v: usize) -> Result<(), MeshError> {
        if v < self.vertices.len() {
            Ok(())
        } else {
            Err(MeshError::VertexOutOfRange {
                index: v,
                count: self.vertices.len(),
            })
        }
    }

    fn corner(&self, f: usize, lv: usize) -> Result<usize, MeshError> {
        let range = self.facet_corners(f)?;
        if lv >= range.len() {
            return Err(MeshError::InvalidFacet(format!(
                "facet {f} has {} vertices, no position {lv}",
                range.len()
            )));
        }
        Ok(range.start + lv)
    }
}
