use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use thiserror::Error;

/// Eigenvalues of the centered scatter matrix below this fraction of the largest
/// one are treated as zero when estimating the rank of a point cloud.
const RANK_TOLERANCE: f64 = 1e-10;
const MIN_SCATTER: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Point sets differ in size: {from} moving points vs {to} reference points")]
    CountMismatch { from: usize, to: usize },

    #[error("Insufficient points for stable alignment: requires at least 3, but found {found}")]
    InsufficientPoints { found: usize },

    #[error(
        "Degenerate anchor geometry: centered point cloud has rank {rank}, at least 2 is required"
    )]
    DegenerateGeometry { rank: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    #[inline]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    pub transform: RigidTransform,
    pub rmsd: f64,
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Rank (0 to 3) of the point cloud after subtracting its centroid.
pub fn centered_rank(points: &[Point3<f64>]) -> usize {
    let Some(center) = centroid(points) else {
        return 0;
    };
    let scatter = points
        .iter()
        .map(|p| p - center)
        .fold(Matrix3::zeros(), |acc, v| acc + v * v.transpose());

    let eigenvalues = scatter.symmetric_eigenvalues();
    let largest = eigenvalues.iter().fold(0.0_f64, |acc, &e| acc.max(e));
    if largest <= MIN_SCATTER {
        return 0;
    }
    eigenvalues
        .iter()
        .filter(|&&e| e > largest * RANK_TOLERANCE)
        .count()
}

/// Least-squares rigid superposition (Kabsch) of `from_points` onto `to_points`.
///
/// Both clouds must hold the same number (at least three) of corresponding points
/// and span at least a plane once centered.
pub fn superpose(
    from_points: &[Point3<f64>],
    to_points: &[Point3<f64>],
) -> Result<Superposition, GeometryError> {
    if from_points.len() != to_points.len() {
        return Err(GeometryError::CountMismatch {
            from: from_points.len(),
            to: to_points.len(),
        });
    }
    if from_points.len() < 3 {
        return Err(GeometryError::InsufficientPoints {
            found: from_points.len(),
        });
    }
    for points in [from_points, to_points] {
        let rank = centered_rank(points);
        if rank < 2 {
            return Err(GeometryError::DegenerateGeometry { rank });
        }
    }

    let transform = calculate_transformation(from_points, to_points)?;
    let moved: Vec<Point3<f64>> = from_points.iter().map(|p| transform.apply(p)).collect();
    let rmsd = calculate_rmsd(&moved, to_points).ok_or(GeometryError::CountMismatch {
        from: moved.len(),
        to: to_points.len(),
    })?;

    Ok(Superposition { transform, rmsd })
}

fn calculate_transformation(
    from_points: &[Point3<f64>],
    to_points: &[Point3<f64>],
) -> Result<RigidTransform, GeometryError> {
    let (Some(from_centroid), Some(to_centroid)) = (centroid(from_points), centroid(to_points))
    else {
        return Err(GeometryError::InsufficientPoints { found: 0 });
    };

    let h = from_points
        .iter()
        .zip(to_points.iter())
        .fold(Matrix3::zeros(), |acc, (f, t)| {
            acc + (t - to_centroid) * (f - from_centroid).transpose()
        });

    let svd = h.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(GeometryError::DegenerateGeometry {
            rank: centered_rank(from_points),
        });
    };

    let mut correction = Matrix3::identity();
    if (u * v_t).determinant() < 0.0 {
        let smallest = svd.singular_values.imin();
        correction[(smallest, smallest)] = -1.0;
    }

    // SVD factors are orthonormal already; re-orthogonalizing from an identity guess
    // stalls on half-turn rotations.
    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);
    let translation = to_centroid.coords - rotation * from_centroid.coords;

    Ok(RigidTransform {
        rotation,
        translation,
    })
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Position of a fourth substituent on a tetrahedral center, opposite the sum of
/// the three existing bond directions. `None` when the three bonds are coplanar
/// with the center or one neighbor coincides with it.
pub fn place_tetrahedral_substituent(
    center: &Point3<f64>,
    neighbors: &[Point3<f64>; 3],
    bond_length: f64,
) -> Option<Point3<f64>> {
    let mut direction_sum = Vector3::zeros();
    for neighbor in neighbors {
        let bond = neighbor - center;
        let length = bond.norm();
        if length < 1e-9 {
            return None;
        }
        direction_sum += bond / length;
    }
    let direction = -direction_sum;
    if direction.norm() < 1e-6 {
        return None;
    }
    Some(center + direction.normalize() * bond_length)
}
