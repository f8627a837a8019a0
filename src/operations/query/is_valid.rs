use std::fmt;

use tracing::debug;

use crate::topology::{Entity, EntityId, EntityType, GeoModel};

/// One broken invariant found by [`IsValid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityIssue {
    /// Offending entity, `None` for model-wide problems.
    pub entity: Option<EntityId>,
    pub message: String,
}

impl ValidityIssue {
    fn new(entity: EntityId, message: impl Into<String>) -> Self {
        Self {
            entity: Some(entity),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entity {
            Some(id) => write!(f, "{id}: {}", self.message),
            None => write!(f, "model: {}", self.message),
        }
    }
}

/// Validates the connectivity, the meshes and the shared-vertex registry of
/// a model.
pub struct IsValid {
    check_meshes: bool,
}

impl Default for IsValid {
    fn default() -> Self {
        Self::new()
    }
}

impl IsValid {
    /// Creates a new `IsValid` query checking everything.
    #[must_use]
    pub fn new() -> Self {
        Self { check_meshes: true }
    }

    /// Whether the meshes are checked besides the connectivity.
    #[must_use]
    pub fn with_meshes(mut self, check_meshes: bool) -> Self {
        self.check_meshes = check_meshes;
        self
    }

    /// Executes the validation, returning every issue found.
    #[must_use]
    pub fn execute(&self, model: &GeoModel) -> Vec<ValidityIssue> {
        let mut issues = Vec::new();
        for ty in EntityType::STORED {
            for (index, entity) in model.elements(ty).iter().enumerate() {
                check_connectivity(model, EntityId::new(ty, index), entity, &mut issues);
                if self.check_meshes {
                    check_mesh(model, entity, &mut issues);
                }
            }
        }
        check_universe(model, &mut issues);
        if !model.vertices().is_consistent(model) {
            issues.push(ValidityIssue {
                entity: None,
                message: "shared-vertex registry disagrees with the entity meshes".into(),
            });
        }

        for issue in &issues {
            debug!("{issue}");
        }
        issues
    }

    /// Executes the validation, returning `true` if the model is valid.
    #[must_use]
    pub fn is_valid(&self, model: &GeoModel) -> bool {
        self.execute(model).is_empty()
    }
}

fn check_connectivity(
    model: &GeoModel,
    expected: EntityId,
    entity: &Entity,
    issues: &mut Vec<ValidityIssue>,
) {
    let id = entity.id();
    if id != expected {
        issues.push(ValidityIssue::new(expected, format!("stored with id {id}")));
        return;
    }
    let ty = id.ty;

    for &b in entity.boundaries() {
        if Some(b.ty) != ty.boundary_type() {
            issues.push(ValidityIssue::new(id, format!("boundary {b} has the wrong type")));
        } else {
            match model.element(b) {
                Ok(boundary) if boundary.in_boundary().contains(&id) => {}
                Ok(_) => issues.push(ValidityIssue::new(
                    id,
                    format!("boundary {b} does not list it as in-boundary"),
                )),
                Err(_) => issues.push(ValidityIssue::new(id, format!("boundary {b} is missing"))),
            }
        }
    }
    for &ib in entity.in_boundary() {
        if Some(ib.ty) != ty.in_boundary_type() {
            issues.push(ValidityIssue::new(id, format!("in-boundary {ib} has the wrong type")));
        } else {
            match model.element(ib) {
                Ok(other) if other.boundaries().contains(&id) => {}
                Ok(_) => issues.push(ValidityIssue::new(
                    id,
                    format!("in-boundary {ib} does not list it as boundary"),
                )),
                Err(_) => {
                    issues.push(ValidityIssue::new(id, format!("in-boundary {ib} is missing")));
                }
            }
        }
    }

    match ty {
        EntityType::Region => {
            if entity.nb_boundaries() == 0 {
                issues.push(ValidityIssue::new(id, "region has no boundary"));
            }
            if entity.sides().len() != entity.nb_boundaries() {
                issues.push(ValidityIssue::new(
                    id,
                    format!(
                        "{} sides for {} boundaries",
                        entity.sides().len(),
                        entity.nb_boundaries()
                    ),
                ));
            }
        }
        EntityType::Line if entity.nb_boundaries() != 2 => {
            issues.push(ValidityIssue::new(
                id,
                format!("line has {} boundary corners", entity.nb_boundaries()),
            ));
        }
        _ => {}
    }
    if ty.in_boundary_allowed() && ty != EntityType::Surface && entity.nb_in_boundary() == 0 {
        issues.push(ValidityIssue::new(id, "bounds nothing"));
    }
    if ty == EntityType::Surface
        && entity.nb_in_boundary() == 0
        && !model.universe().boundaries().contains(&id)
    {
        issues.push(ValidityIssue::new(id, "bounds no region"));
    }

    if let Some(parent_type) = ty.parent_type() {
        match entity.parent() {
            Some(p) => match model.element(p) {
                Ok(parent) if parent.children().contains(&id) => {}
                Ok(_) => issues.push(ValidityIssue::new(
                    id,
                    format!("parent {p} does not list it as child"),
                )),
                Err(_) => issues.push(ValidityIssue::new(id, format!("parent {p} is missing"))),
            },
            None if model.nb_elements(parent_type) > 0 => {
                issues.push(ValidityIssue::new(
                    id,
                    format!("no parent among the {parent_type} entities"),
                ));
            }
            None => {}
        }
    }
    for &c in entity.children() {
        match model.element(c) {
            Ok(child) if child.parent() == Some(id) => {}
            Ok(_) => issues.push(ValidityIssue::new(
                id,
                format!("child {c} has another parent"),
            )),
            Err(_) => issues.push(ValidityIssue::new(id, format!("child {c} is missing"))),
        }
    }
    if ty.is_geological() && entity.nb_children() == 0 {
        issues.push(ValidityIssue::new(id, "groups no entity"));
    }
}

fn check_mesh(model: &GeoModel, entity: &Entity, issues: &mut Vec<ValidityIssue>) {
    let Some(component) = entity.mesh() else {
        return;
    };
    let id = entity.id();
    let mesh = component.mesh();
    let mut fail = |message: String| issues.push(ValidityIssue::new(id, message));

    match id.ty {
        EntityType::Corner => {
            if mesh.nb_vertices() != 1 {
                fail(format!("corner has {} vertices", mesh.nb_vertices()));
            }
            if mesh.nb_edges() + mesh.nb_facets() + mesh.nb_cells() > 0 {
                fail("corner has mesh elements".into());
            }
        }
        EntityType::Line => {
            let n = mesh.nb_vertices();
            if n < 2 || mesh.nb_edges() == 0 {
                fail(format!("line has {n} vertices and {} edges", mesh.nb_edges()));
                return;
            }
            if mesh.nb_facets() + mesh.nb_cells() > 0 {
                fail("line has facets or cells".into());
            }
            let incidences = mesh.vertex_incidences();
            for (v, &count) in incidences.iter().enumerate() {
                let expected = if v == 0 || v == n - 1 { 1 } else { 2 };
                if count != expected {
                    fail(format!("vertex {v} is in {count} edges, expected {expected}"));
                }
            }
            let closed = model.is_line_closed(id).unwrap_or(false);
            if let Ok(duplicated) = model.duplicated_vertices(id) {
                let only_ends = duplicated.iter().all(|&v| v == 0 || v == n - 1);
                if !duplicated.is_empty() && !(closed && only_ends) {
                    fail(format!("vertices {duplicated:?} are duplicated"));
                }
            }
        }
        EntityType::Surface => {
            if mesh.nb_vertices() < 3 || mesh.nb_facets() == 0 {
                fail(format!(
                    "surface has {} vertices and {} facets",
                    mesh.nb_vertices(),
                    mesh.nb_facets()
                ));
                return;
            }
            if mesh.nb_edges() + mesh.nb_cells() > 0 {
                fail("surface has edges or cells".into());
            }
            let isolated = mesh.vertex_incidences().iter().filter(|&&c| c == 0).count();
            if isolated > 0 {
                fail(format!("{isolated} isolated vertices"));
            }
            for f in 0..mesh.nb_facets() {
                if component.is_facet_degenerate(f).unwrap_or(true) {
                    fail(format!("facet {f} is degenerate"));
                }
            }
            let components = mesh.nb_facet_components();
            if components != 1 {
                fail(format!("{components} connected components"));
            }
        }
        EntityType::Region => {
            if mesh.nb_edges() + mesh.nb_facets() > 0 {
                fail("region has edges or facets".into());
            }
        }
        _ => {}
    }
}

fn check_universe(model: &GeoModel, issues: &mut Vec<ValidityIssue>) {
    let universe = model.universe();
    let id = universe.id();
    for &b in universe.boundaries() {
        if b.ty != EntityType::Surface || model.element(b).is_err() {
            issues.push(ValidityIssue::new(
                id,
                format!("boundary {b} is not a surface of the model"),
            ));
        }
    }
    if universe.sides().len() != universe.nb_boundaries() {
        issues.push(ValidityIssue::new(
            id,
            format!(
                "{} sides for {} boundaries",
                universe.sides().len(),
                universe.nb_boundaries()
            ),
        ));
    }
}
