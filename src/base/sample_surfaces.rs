use super::{Facet, SurfaceMesh};
use gemlab::shapes::GeoKind;

/// Holds sample contact surfaces
pub struct SampleSurfaces {}

impl SampleSurfaces {
    /// Returns a flat square patch of n × n Qua4 facets at height z
    ///
    /// ```text
    ///   y
    ///   ↑
    ///   3-----------2      (n = 1)
    ///   |           |
    ///   |    [0]    |      upward = true:  counter-clockwise, normal = +z
    ///   |           |      upward = false: clockwise,         normal = -z
    ///   0-----------1 → x
    /// ```
    ///
    /// # Input
    ///
    /// * `x0, y0` -- coordinates of the lower-left corner
    /// * `size` -- length of the side of the square
    /// * `n` -- number of facets along each direction
    /// * `z` -- height of the patch
    /// * `upward` -- whether the outward normal points to +z or to -z
    pub fn flat_qua4(x0: f64, y0: f64, size: f64, n: usize, z: f64, upward: bool) -> SurfaceMesh {
        let np = n + 1;
        let h = size / (n as f64);
        let mut coords = Vec::with_capacity(np * np);
        for j in 0..np {
            for i in 0..np {
                coords.push([x0 + (i as f64) * h, y0 + (j as f64) * h, z]);
            }
        }
        let mut facets = Vec::with_capacity(n * n);
        for j in 0..n {
            for i in 0..n {
                let a = i + j * np;
                let (b, c, d) = (a + 1, a + 1 + np, a + np);
                let points = if upward { vec![a, b, c, d] } else { vec![a, d, c, b] };
                facets.push(Facet {
                    kind: GeoKind::Qua4,
                    points,
                });
            }
        }
        SurfaceMesh { coords, facets }
    }

    /// Returns a flat square patch of 2 × n × n Tri3 facets at height z
    ///
    /// Each square of the grid is split along its diagonal from the lower-left corner.
    pub fn flat_tri3(x0: f64, y0: f64, size: f64, n: usize, z: f64, upward: bool) -> SurfaceMesh {
        let qua = SampleSurfaces::flat_qua4(x0, y0, size, n, z, upward);
        let mut facets = Vec::with_capacity(2 * qua.facets.len());
        for facet in &qua.facets {
            let p = &facet.points;
            facets.push(Facet {
                kind: GeoKind::Tri3,
                points: vec![p[0], p[1], p[2]],
            });
            facets.push(Facet {
                kind: GeoKind::Tri3,
                points: vec![p[0], p[2], p[3]],
            });
        }
        SurfaceMesh {
            coords: qua.coords,
            facets,
        }
    }

    /// Returns one curved Qua8 facet over [0,1]² with its mid nodes lifted
    ///
    /// ```text
    ///   3-----6-----2
    ///   |           |     z(corners) = z
    ///   7    [0]    5     z(mid nodes) = z + bulge
    ///   |           |
    ///   0-----4-----1
    /// ```
    pub fn curved_qua8(z: f64, bulge: f64) -> SurfaceMesh {
        SurfaceMesh {
            coords: vec![
                [0.0, 0.0, z],
                [1.0, 0.0, z],
                [1.0, 1.0, z],
                [0.0, 1.0, z],
                [0.5, 0.0, z + bulge],
                [1.0, 0.5, z + bulge],
                [0.5, 1.0, z + bulge],
                [0.0, 0.5, z + bulge],
            ],
            facets: vec![Facet {
                kind: GeoKind::Qua8,
                points: vec![0, 1, 2, 3, 4, 5, 6, 7],
            }],
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
