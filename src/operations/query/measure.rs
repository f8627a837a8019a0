use crate::error::{OperationError, Result, TopologyError};
use crate::math::{
    point_segment_distance, point_triangle_squared_distance, Point3, Vector3, TOLERANCE,
};
use crate::topology::{EntityId, EntityType, GeoModel, MeshComponent};

fn invalid_type(id: EntityId, what: &str) -> crate::error::GeoRepError {
    TopologyError::InvalidEntityType(format!("{what} is not defined for {id}")).into()
}

/// Computes the size of an entity: 0 for a corner, the length of a line, the
/// area of a surface, the volume of a region, the sum over the children of a
/// geological entity.
pub struct Size {
    id: EntityId,
}

impl Size {
    /// Creates a new `Size` query.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or is the universe.
    pub fn execute(&self, model: &GeoModel) -> Result<f64> {
        let entity = model.element(self.id)?;
        match self.id.ty {
            EntityType::Corner => Ok(0.0),
            EntityType::Line => Ok(model.entity_mesh(self.id)?.total_length()),
            EntityType::Surface => surface_area(model.entity_mesh(self.id)?),
            EntityType::Region => {
                // Signed tetrahedra against the origin, oriented by the sides.
                let mut volume = 0.0;
                for (&surface, &side) in entity.boundaries().iter().zip(entity.sides()) {
                    let v = signed_volume(model.entity_mesh(surface)?)?;
                    volume += if side { v } else { -v };
                }
                Ok(volume.abs())
            }
            ty if ty.is_geological() => entity
                .children()
                .iter()
                .map(|&child| Size::new(child).execute(model))
                .sum(),
            _ => Err(invalid_type(self.id, "size")),
        }
    }
}

fn surface_area(mesh: &MeshComponent) -> Result<f64> {
    (0..mesh.mesh().nb_facets()).map(|f| mesh.facet_area(f)).sum()
}

fn signed_volume(mesh: &MeshComponent) -> Result<f64> {
    let mut volume = 0.0;
    for f in 0..mesh.mesh().nb_facets() {
        let vertices = mesh.mesh().facet_vertices(f)?;
        let p0 = mesh.vertex(vertices[0])?.coords;
        for w in vertices[1..].windows(2) {
            let p1 = mesh.vertex(w[0])?.coords;
            let p2 = mesh.vertex(w[1])?.coords;
            volume += p0.dot(&p1.cross(&p2)) / 6.0;
        }
    }
    Ok(volume)
}

/// Computes the size-weighted barycenter of some segments of a line or some
/// facets of a surface.
pub struct Barycenter {
    id: EntityId,
    elements: Vec<usize>,
}

impl Barycenter {
    /// Creates a new `Barycenter` query over the given segments or facets.
    #[must_use]
    pub fn new(id: EntityId, elements: impl IntoIterator<Item = usize>) -> Self {
        Self {
            id,
            elements: elements.into_iter().collect(),
        }
    }

    /// Executes the query. When all the elements have a null size, the plain
    /// mean of their centers is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not a line or a surface, if no
    /// element is given, or if an element is out of range.
    pub fn execute(&self, model: &GeoModel) -> Result<Point3> {
        if self.elements.is_empty() {
            return Err(OperationError::InvalidInput(format!(
                "no element given for the barycenter of {}",
                self.id
            ))
            .into());
        }
        let mesh = model.entity_mesh(self.id)?;
        let mut weighted = Vector3::zeros();
        let mut plain = Vector3::zeros();
        let mut total = 0.0;
        for &e in &self.elements {
            let (center, size) = match self.id.ty {
                EntityType::Line => (mesh.segment_barycenter(e)?, mesh.segment_length(e)?),
                EntityType::Surface => (mesh.facet_barycenter(e)?, mesh.facet_area(e)?),
                _ => return Err(invalid_type(self.id, "barycenter")),
            };
            weighted += center.coords * size;
            plain += center.coords;
            total += size;
        }

        if total > TOLERANCE {
            Ok(Point3::from(weighted / total))
        } else {
            #[allow(clippy::cast_precision_loss)]
            let n = self.elements.len() as f64;
            Ok(Point3::from(plain / n))
        }
    }
}

/// Computes the distance from a point to an entity.
///
/// Lines are measured segment by segment, surfaces triangle by triangle over
/// the fan of each facet, regions through their boundary surfaces and
/// geological entities through their children.
pub struct Distance {
    id: EntityId,
    point: Point3,
}

impl Distance {
    /// Creates a new `Distance` query.
    #[must_use]
    pub fn new(id: EntityId, point: Point3) -> Self {
        Self { id, point }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist, has no geometry or is
    /// the universe.
    pub fn execute(&self, model: &GeoModel) -> Result<f64> {
        let entity = model.element(self.id)?;
        let p = &self.point;
        let distance = match self.id.ty {
            EntityType::Corner => {
                let mesh = model.entity_mesh(self.id)?;
                (p - mesh.vertex(0)?).norm()
            }
            EntityType::Line => {
                let points = model.entity_mesh(self.id)?.mesh().points();
                points
                    .windows(2)
                    .map(|w| point_segment_distance(p, &w[0], &w[1]))
                    .fold(f64::INFINITY, f64::min)
            }
            EntityType::Surface => surface_distance(model.entity_mesh(self.id)?, p)?,
            EntityType::Region => closest(entity.boundaries(), model, p)?,
            ty if ty.is_geological() => closest(entity.children(), model, p)?,
            _ => return Err(invalid_type(self.id, "distance")),
        };

        if !distance.is_finite() {
            return Err(
                OperationError::InvalidInput(format!("{} has no geometry", self.id)).into(),
            );
        }
        Ok(distance)
    }
}

fn surface_distance(mesh: &MeshComponent, p: &Point3) -> Result<f64> {
    let mut best = f64::INFINITY;
    for f in 0..mesh.mesh().nb_facets() {
        let vertices = mesh.mesh().facet_vertices(f)?;
        let a = mesh.vertex(vertices[0])?;
        for w in vertices[1..].windows(2) {
            let (b, c) = (mesh.vertex(w[0])?, mesh.vertex(w[1])?);
            best = best.min(point_triangle_squared_distance(p, a, b, c));
        }
    }
    Ok(best.sqrt())
}

fn closest(ids: &[EntityId], model: &GeoModel, p: &Point3) -> Result<f64> {
    let mut best = f64::INFINITY;
    for &id in ids {
        match Distance::new(id, *p).execute(model) {
            Ok(d) => best = best.min(d),
            Err(crate::error::GeoRepError::Operation(OperationError::InvalidInput(_))) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(best)
}
