use crate::StrError;
use gemlab::shapes::GeoKind;

/// Holds the coordinates and weight of an integration point: `[r, s, weight]`
pub type IntegPointData = [f64; 3];

const A: f64 = 0.5773502691896257; // 1/√3
const B: f64 = 0.7745966692414834; // √(3/5)
const W5: f64 = 5.0 / 9.0;
const W8: f64 = 8.0 / 9.0;

/// Three-point rule for triangles (exact for quadratic polynomials)
pub const IP_TRI_3: [IntegPointData; 3] = [
    [1.0 / 6.0, 1.0 / 6.0, 1.0 / 6.0],
    [2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0],
    [1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
];

/// 2×2 Gauss rule for quadrilaterals
pub const IP_QUA_4: [IntegPointData; 4] = [
    [-A, -A, 1.0],
    [A, -A, 1.0],
    [-A, A, 1.0],
    [A, A, 1.0],
];

/// 3×3 Gauss rule for quadrilaterals
pub const IP_QUA_9: [IntegPointData; 9] = [
    [-B, -B, W5 * W5],
    [0.0, -B, W8 * W5],
    [B, -B, W5 * W5],
    [-B, 0.0, W5 * W8],
    [0.0, 0.0, W8 * W8],
    [B, 0.0, W5 * W8],
    [-B, B, W5 * W5],
    [0.0, B, W8 * W5],
    [B, B, W5 * W5],
];

/// Returns the integration points of a surface facet
///
/// Triangles use 3 points, Qua4 uses 2×2 points, and Qua8/Qua9 use 3×3 points.
pub fn facet_integ_points(kind: GeoKind) -> Result<&'static [IntegPointData], StrError> {
    match kind {
        GeoKind::Tri3 | GeoKind::Tri6 => Ok(&IP_TRI_3),
        GeoKind::Qua4 => Ok(&IP_QUA_4),
        GeoKind::Qua8 | GeoKind::Qua9 => Ok(&IP_QUA_9),
        _ => Err("facet kind is not supported; use Tri3, Tri6, Qua4, Qua8, or Qua9"),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::facet_integ_points;
    use gemlab::shapes::GeoKind;
    use russell_lab::approx_eq;

    #[test]
    fn facet_integ_points_handles_errors() {
        assert_eq!(
            facet_integ_points(GeoKind::Hex8).err(),
            Some("facet kind is not supported; use Tri3, Tri6, Qua4, Qua8, or Qua9")
        );
    }

    #[test]
    fn weights_sum_to_reference_area() {
        let tri = facet_integ_points(GeoKind::Tri3).unwrap();
        approx_eq(tri.iter().map(|p| p[2]).sum::<f64>(), 0.5, 1e-15);
        for kind in [GeoKind::Qua4, GeoKind::Qua8, GeoKind::Qua9] {
            let qua = facet_integ_points(kind).unwrap();
            approx_eq(qua.iter().map(|p| p[2]).sum::<f64>(), 4.0, 1e-14);
        }
    }

    #[test]
    fn rules_integrate_polynomials_exactly() {
        // ∫∫ r s dA over the reference triangle = 1/24
        let tri = facet_integ_points(GeoKind::Tri6).unwrap();
        let res: f64 = tri.iter().map(|p| p[0] * p[1] * p[2]).sum();
        approx_eq(res, 1.0 / 24.0, 1e-15);

        // ∫∫ r² s² dA over [-1,1]² = 4/9
        let qua = facet_integ_points(GeoKind::Qua4).unwrap();
        let res: f64 = qua.iter().map(|p| p[0] * p[0] * p[1] * p[1] * p[2]).sum();
        approx_eq(res, 4.0 / 9.0, 1e-15);

        // ∫∫ r⁴ s² dA over [-1,1]² = 4/15
        let qua = facet_integ_points(GeoKind::Qua9).unwrap();
        let res: f64 = qua.iter().map(|p| p[0].powi(4) * p[1] * p[1] * p[2]).sum();
        approx_eq(res, 4.0 / 15.0, 1e-14);
    }
}
