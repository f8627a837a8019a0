use tracing::{debug, info};

use crate::error::{OperationError, Result};
use crate::mesh::NO_ADJACENT;
use crate::topology::{
    Entity, EntityId, EntityType, GeoModel, GeoModelVertices, MeshComponent, NO_ID,
};

/// A line end whose corner bounds more lines than this is duplicated by a
/// cut; a corner bounding fewer stays shared by both sides.
pub const CORNER_DUPLICATION_THRESHOLD: usize = 3;

/// Opens a surface along one of its inner lines.
///
/// Every edge of the line must be an inner facet edge of the surface. The
/// facets on one side of the line get their own copies of the line's inner
/// vertices, bound to the same model vertices, and facet adjacency across
/// the line is removed. A line end is copied too when its corner bounds
/// more than [`CORNER_DUPLICATION_THRESHOLD`] lines.
///
/// The surface is only modified if the whole cut succeeds.
pub struct CutByLine {
    surface: EntityId,
    line: EntityId,
}

impl CutByLine {
    /// Creates a new `CutByLine` operation.
    #[must_use]
    pub fn new(surface: EntityId, line: EntityId) -> Self {
        Self { surface, line }
    }

    /// Executes the cut, returning the number of surface vertices created.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the line does not lie
    /// along inner edges of the surface or both of its ends would need
    /// duplication, and [`OperationError::AmbiguousTraversal`] if the opened
    /// border cannot be followed along the line.
    pub fn execute(&self, model: &mut GeoModel) -> Result<usize> {
        if self.surface.ty != EntityType::Surface || self.line.ty != EntityType::Line {
            return Err(OperationError::InvalidInput(format!(
                "cannot cut {} by {}",
                self.surface, self.line
            ))
            .into());
        }

        let line = model.element(self.line)?;
        let gids = model.entity_mesh(self.line)?.model_vertex_ids().to_vec();
        if gids.len() < 2 || gids.contains(&NO_ID) {
            return Err(OperationError::InvalidInput(format!(
                "{} needs at least two vertices bound to model vertices",
                self.line
            ))
            .into());
        }
        let last = gids.len() - 1;
        let duplicate_start = end_corner_duplicates(model, line, gids[0])?;
        let duplicate_end = end_corner_duplicates(model, line, gids[last])?;
        if duplicate_start && duplicate_end {
            return Err(OperationError::InvalidInput(format!(
                "both corners of {} would need duplication",
                self.line
            ))
            .into());
        }

        let mut work = model.entity_mesh(self.surface)?.clone();
        sever(&mut work, &gids)?;
        let created = walk_and_split(
            &mut work,
            &gids,
            duplicate_start,
            duplicate_end,
            model.vertices(),
        )?;

        let (mesh, vertices) = model.mesh_and_vertices_mut(self.surface)?;
        *mesh = work;
        for &v in &created {
            vertices.add_occurrence(mesh.model_vertex_id(v), self.surface, v);
        }
        info!(
            "cut {} along {}: {} vertices duplicated",
            self.surface,
            self.line,
            created.len()
        );
        Ok(created.len())
    }
}

/// Whether the corner of `line` at model vertex `g` must be duplicated.
fn end_corner_duplicates(model: &GeoModel, line: &Entity, g: usize) -> Result<bool> {
    for &corner in line.boundaries() {
        if model.entity_mesh(corner)?.model_vertex_id(0) == g {
            let nb = model.element(corner)?.nb_in_boundary();
            return Ok(nb > CORNER_DUPLICATION_THRESHOLD);
        }
    }
    Err(OperationError::InvalidInput(format!(
        "{} has no boundary corner at model vertex {g}",
        line.id()
    ))
    .into())
}

/// Removes facet adjacency across every edge of the line.
fn sever(work: &mut MeshComponent, gids: &[usize]) -> Result<()> {
    for pair in gids.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (f, e) = work.edge_from_model_vertex_ids(a, b)?.ok_or_else(|| {
            OperationError::InvalidInput(format!("no facet edge joins model vertices {a} and {b}"))
        })?;
        let f2 = work.mesh().adjacent(f, e)?;
        if f2 == NO_ADJACENT {
            return Err(OperationError::InvalidInput(format!(
                "edge {a}-{b} is on the surface border"
            ))
            .into());
        }
        let e2 = work
            .edge_in_facet_from_model_vertex_ids(f2, a, b)?
            .ok_or_else(|| {
                OperationError::InvalidInput(format!(
                    "facet {f2} is adjacent to facet {f} but misses edge {a}-{b}"
                ))
            })?;
        work.mesh_mut().set_adjacent(f, e, NO_ADJACENT)?;
        work.mesh_mut().set_adjacent(f2, e2, NO_ADJACENT)?;
    }
    Ok(())
}

/// Walks the opened border on the side of the first oriented line edge and
/// gives that side its own copies of the vertices. Returns the new local
/// vertices.
fn walk_and_split(
    work: &mut MeshComponent,
    gids: &[usize],
    duplicate_start: bool,
    duplicate_end: bool,
    vertices: &GeoModelVertices,
) -> Result<Vec<usize>> {
    let last = gids.len() - 1;
    let (mut f, v) = work
        .oriented_edge_from_model_vertex_ids(gids[0], gids[1])?
        .ok_or_else(|| {
            OperationError::InvalidInput(format!(
                "no facet runs from model vertex {} to {}",
                gids[0], gids[1]
            ))
        })?;
    let start_facet = f;
    let mut id0 = work.mesh().facet_vertex(f, v)?;
    let mut id1 = work.mesh().facet_vertex(f, work.mesh().next_in_facet(f, v)?)?;
    let mut created = Vec::new();

    let new_corner = if duplicate_start || duplicate_end {
        let g = if duplicate_start { gids[0] } else { gids[last] };
        let point = *vertices.point(g).ok_or_else(|| {
            OperationError::InvalidInput(format!("model vertex {g} does not exist"))
        })?;
        let corner = work.create_vertex(point, g);
        created.push(corner);
        Some(corner)
    } else {
        None
    };
    let mut split_corner = duplicate_start.then_some((id0, start_facet));

    for k in 1..last {
        let ambiguous = || {
            OperationError::AmbiguousTraversal(format!(
                "lost the border at model vertex {}",
                gids[k]
            ))
        };
        let from = work.facet_vertex_id(f, id0)?.ok_or_else(ambiguous)?;
        let at = work.facet_vertex_id(f, id1)?.ok_or_else(ambiguous)?;
        let step = work.next_on_border(f, from, at)?;
        let next_id1 = work.mesh().facet_vertex(step.facet, step.next_in_facet)?;
        if work.model_vertex_id(next_id1) != gids[k + 1] {
            return Err(OperationError::AmbiguousTraversal(format!(
                "border leaves the line after model vertex {}",
                gids[k]
            ))
            .into());
        }

        let facets = work.facets_around_vertex(id1, false, Some(f))?;
        let copy = duplicate_vertex(work, id1)?;
        replace_vertex(work, &facets, id1, copy)?;
        debug!("vertex {id1} copied to {copy} in {} facets", facets.len());
        created.push(copy);

        f = step.facet;
        id0 = copy;
        id1 = next_id1;
    }

    if duplicate_end {
        split_corner = Some((id1, f));
    }
    if let (Some((old, side_facet)), Some(new)) = (split_corner, new_corner) {
        // Only the facets on the walked side of the corner get the copy;
        // the line must have opened the fan around it.
        let side = work.facets_around_vertex(old, false, Some(side_facet))?;
        if side.len() == nb_facets_with_vertex(work, old)? {
            return Err(OperationError::InvalidInput(format!(
                "the cut does not open the surface around model vertex {}",
                work.model_vertex_id(old)
            ))
            .into());
        }
        replace_vertex(work, &side, old, new)?;
    }
    Ok(created)
}

fn nb_facets_with_vertex(work: &MeshComponent, v: usize) -> Result<usize> {
    let mut nb = 0;
    for f in 0..work.mesh().nb_facets() {
        if work.mesh().facet_vertices(f)?.contains(&v) {
            nb += 1;
        }
    }
    Ok(nb)
}

fn duplicate_vertex(work: &mut MeshComponent, v: usize) -> Result<usize> {
    let point = *work.vertex(v)?;
    let g = work.model_vertex_id(v);
    Ok(work.create_vertex(point, g))
}

fn replace_vertex(work: &mut MeshComponent, facets: &[usize], old: usize, new: usize) -> Result<()> {
    for &f in facets {
        if let Some(lv) = work.facet_vertex_id(f, old)? {
            work.mesh_mut().set_facet_vertex(f, lv, new)?;
        }
    }
    Ok(())
}
