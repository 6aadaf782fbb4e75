//! Dense linear solver for small nodal systems
//!
//! Circuits on a lab bench have a handful of nodes, so an O(n³) Gaussian
//! elimination is all that is needed.

use super::PhysicsError;

/// Pivots smaller than this are treated as zero
const PIVOT_EPSILON: f64 = 1e-18;

/// Solve `A x = b` by Gaussian elimination with partial pivoting
///
/// # Errors
///
/// - `DimensionMismatch` if `A` is not square or `b` has the wrong length
/// - `SingularMatrix` if no usable pivot exists for some column
///
/// # Example
/// ```
/// use virtual_lab_core_rs::physics::linalg::solve_linear_system;
///
/// // 2x + y = 5, x - y = 1  =>  x = 2, y = 1
/// let x = solve_linear_system(vec![vec![2.0, 1.0], vec![1.0, -1.0]], vec![5.0, 1.0]).unwrap();
/// assert!((x[0] - 2.0).abs() < 1e-12);
/// assert!((x[1] - 1.0).abs() < 1e-12);
/// ```
pub fn solve_linear_system(
    mut matrix: Vec<Vec<f64>>,
    mut rhs: Vec<f64>,
) -> Result<Vec<f64>, PhysicsError> {
    let n = matrix.len();
    if rhs.len() != n || matrix.iter().any(|row| row.len() != n) {
        return Err(PhysicsError::DimensionMismatch {
            rows: n,
            cols: matrix.first().map_or(0, Vec::len),
            len: rhs.len(),
        });
    }

    // Forward elimination
    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);

        if matrix[pivot_row][col].abs() < PIVOT_EPSILON {
            return Err(PhysicsError::SingularMatrix { column: col });
        }

        matrix.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    // Back substitution
    let mut solution = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| matrix[i][j] * solution[j]).sum();
        solution[i] = (rhs[i] - tail) / matrix[i][i];
    }

    Ok(solution)
}
