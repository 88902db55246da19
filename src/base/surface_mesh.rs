use crate::StrError;
use gemlab::shapes::GeoKind;

/// Holds a surface facet (a boundary face of a solid element)
///
/// The local numbering of the points follows gemlab; the counter-clockwise sequence of the
/// corner points (seen from outside) defines the outward normal.
#[derive(Clone, Debug, PartialEq)]
pub struct Facet {
    /// Kind of facet (Tri3, Tri6, Qua4, Qua8, or Qua9)
    pub kind: GeoKind,

    /// Indices of the points in SurfaceMesh::coords
    pub points: Vec<usize>,
}

/// Holds the description of a contact surface given by the mesh
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceMesh {
    /// Reference (undeformed) coordinates of the surface points
    pub coords: Vec<[f64; 3]>,

    /// Ordered list of facets
    pub facets: Vec<Facet>,
}

impl SurfaceMesh {
    /// Returns the number of points
    pub fn npoint(&self) -> usize {
        self.coords.len()
    }

    /// Returns the number of facets
    pub fn nfacet(&self) -> usize {
        self.facets.len()
    }

    /// Checks the consistency of the facets
    ///
    /// An empty surface is consistent; the contact interface rejects it at initialization.
    pub fn validate(&self) -> Result<(), StrError> {
        for facet in &self.facets {
            match facet.kind {
                GeoKind::Tri3 | GeoKind::Tri6 | GeoKind::Qua4 | GeoKind::Qua8 | GeoKind::Qua9 => (),
                _ => return Err("facet kind is not supported; use Tri3, Tri6, Qua4, Qua8, or Qua9"),
            }
            if facet.points.len() != facet.kind.nnode() {
                return Err("number of facet points must equal the number of nodes of its kind");
            }
            if facet.points.iter().any(|p| *p >= self.coords.len()) {
                return Err("facet point index is out of bounds");
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
