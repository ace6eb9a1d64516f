/// Error types for the transforms module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransformError {
    /// The quaternion does not have exactly four components.
    #[error("Malformed quaternion: expected 4 components (w, x, y, z), got {0}")]
    MalformedQuaternion(usize),
}

/// Compute the rotation matrix from a quaternion in `(w, x, y, z)` order.
///
/// # Arguments
///
/// * `q` - The quaternion as `[w, x, y, z]`.
///
/// # Returns
///
/// The 3x3 rotation matrix in row-major order.
///
/// PRECONDITION: the quaternion has unit norm. It is neither validated nor normalized, so a
/// non-unit quaternion yields a non-orthonormal matrix.
///
/// Example:
///
/// ```
/// use geoprep_3d::transforms::quaternion_to_rotation_matrix;
///
/// let rotation = quaternion_to_rotation_matrix(&[1.0, 0.0, 0.0, 0.0]);
/// assert_eq!(rotation, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
/// ```
pub fn quaternion_to_rotation_matrix(q: &[f64; 4]) -> [[f64; 3]; 3] {
    let [w, x, y, z] = *q;

    [
        [
            1.0 - 2.0 * y * y - 2.0 * z * z,
            2.0 * x * y - 2.0 * z * w,
            2.0 * x * z + 2.0 * y * w,
        ],
        [
            2.0 * x * y + 2.0 * z * w,
            1.0 - 2.0 * x * x - 2.0 * z * z,
            2.0 * y * z - 2.0 * x * w,
        ],
        [
            2.0 * x * z - 2.0 * y * w,
            2.0 * y * z + 2.0 * x * w,
            1.0 - 2.0 * x * x - 2.0 * y * y,
        ],
    ]
}

/// Read a quaternion in `(w, x, y, z)` order from a slice.
///
/// Fails with [`TransformError::MalformedQuaternion`] when the slice does not hold exactly
/// four components.
pub fn quaternion_from_slice(q: &[f64]) -> Result<[f64; 4], TransformError> {
    q.try_into()
        .map_err(|_| TransformError::MalformedQuaternion(q.len()))
}

/// Euclidean norm of a quaternion.
pub fn quaternion_norm(q: &[f64; 4]) -> f64 {
    q.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// A 4x4 homogeneous camera-to-world transform stored in row-major order.
///
/// The matrix has the layout `[[R, t], [0, 0, 0, 1]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform4x4 {
    matrix: [[f64; 4]; 4],
}

impl Transform4x4 {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        matrix: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Assemble a transform from a rotation matrix and a translation vector.
    ///
    /// # Arguments
    ///
    /// * `rotation` - The 3x3 rotation matrix.
    /// * `translation` - The translation vector.
    ///
    /// PRECONDITION: rotation is orthonormal. This is not checked.
    pub fn from_rotation_translation(rotation: &[[f64; 3]; 3], translation: &[f64; 3]) -> Self {
        let mut matrix = Self::IDENTITY.matrix;
        for (row, (r, t)) in matrix.iter_mut().zip(rotation.iter().zip(translation)) {
            row[..3].copy_from_slice(r);
            row[3] = *t;
        }
        Self { matrix }
    }

    /// Get the full 4x4 matrix.
    #[inline]
    pub fn matrix(&self) -> &[[f64; 4]; 4] {
        &self.matrix
    }

    /// Get the top-left 3x3 rotation block.
    pub fn rotation(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]],
        ]
    }

    /// Get the translation column.
    pub fn translation(&self) -> [f64; 3] {
        [self.matrix[0][3], self.matrix[1][3], self.matrix[2][3]]
    }

    /// Flatten the matrix in row-major order.
    ///
    /// The layout is `r00 r01 r02 t0 r10 r11 r12 t1 r20 r21 r22 t2 0 0 0 1`.
    pub fn row_major(&self) -> [f64; 16] {
        let mut flat = [0.0; 16];
        for (chunk, row) in flat.chunks_exact_mut(4).zip(self.matrix.iter()) {
            chunk.copy_from_slice(row);
        }
        flat
    }

    /// Build a transform from 16 values in row-major order.
    ///
    /// The bottom row is taken as given.
    pub fn from_row_major(values: &[f64; 16]) -> Self {
        let mut matrix = [[0.0; 4]; 4];
        for (row, chunk) in matrix.iter_mut().zip(values.chunks_exact(4)) {
            row.copy_from_slice(chunk);
        }
        Self { matrix }
    }
}

impl Default for Transform4x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
