/// A point cloud with points, colors, and normals.
///
/// Colors and normals, when present, are stored in lockstep with the points: the attribute
/// at position `i` belongs to the point at position `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The colors of the points.
    colors: Option<Vec<[u8; 3]>>,
    // The normals of the points.
    normals: Option<Vec<[f64; 3]>>,
}

impl PointCloud {
    /// Create a new point cloud from points, colors (optional), and normals (optional).
    pub fn new(
        points: Vec<[f64; 3]>,
        colors: Option<Vec<[u8; 3]>>,
        normals: Option<Vec<[f64; 3]>>,
    ) -> Self {
        Self {
            points,
            colors,
            normals,
        }
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> Option<&[[u8; 3]]> {
        self.colors.as_deref()
    }

    /// Get as reference the normals of the points in the point cloud.
    pub fn normals(&self) -> Option<&[[f64; 3]]> {
        self.normals.as_deref()
    }

    /// Build a new point cloud holding the points at the given indices.
    ///
    /// Colors and normals follow their points. The output keeps the order of `indices`.
    ///
    /// PRECONDITION: every index is smaller than [`PointCloud::len`].
    pub fn select_by_index(&self, indices: &[usize]) -> Self {
        let points = indices.iter().map(|&i| self.points[i]).collect();
        let colors = self
            .colors
            .as_ref()
            .map(|colors| indices.iter().map(|&i| colors[i]).collect());
        let normals = self
            .normals
            .as_ref()
            .map(|normals| indices.iter().map(|&i| normals[i]).collect());
        Self::new(points, colors, normals)
    }

    /// Get the minimum bound of the point cloud.
    ///
    /// Returns `None` for an empty point cloud.
    pub fn min_bound(&self) -> Option<[f64; 3]> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold(first, |a, b| {
            [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])]
        }))
    }

    /// Get the maximum bound of the point cloud.
    ///
    /// Returns `None` for an empty point cloud.
    pub fn max_bound(&self) -> Option<[f64; 3]> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold(first, |a, b| {
            [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointcloud() {
        let pointcloud = PointCloud::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            Some(vec![[255, 0, 0], [0, 255, 0]]),
            Some(vec![[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
        );

        assert_eq!(pointcloud.len(), 2);
        assert!(!pointcloud.is_empty());
        assert_eq!(pointcloud.points().len(), 2);
        assert_eq!(pointcloud.colors().map(|c| c.len()), Some(2));
        assert_eq!(pointcloud.normals().map(|n| n.len()), Some(2));

        assert_eq!(pointcloud.points()[0], [0.0, 0.0, 0.0]);
        assert_eq!(pointcloud.points()[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_select_by_index_keeps_attributes() {
        let pointcloud = PointCloud::new(
            vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]],
            Some(vec![[10, 0, 0], [20, 0, 0], [30, 0, 0]]),
            Some(vec![[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
        );

        let selected = pointcloud.select_by_index(&[2, 0]);
        assert_eq!(selected.points(), &[[2.0, 2.0, 2.0], [0.0, 0.0, 0.0]]);
        assert_eq!(selected.colors(), Some(&[[30, 0, 0], [10, 0, 0]][..]));
        assert_eq!(
            selected.normals(),
            Some(&[[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]][..])
        );
    }

    #[test]
    fn test_select_by_index_without_attributes() {
        let pointcloud = PointCloud::new(vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]], None, None);
        let selected = pointcloud.select_by_index(&[1]);
        assert_eq!(selected.len(), 1);
        assert!(selected.colors().is_none());
        assert!(selected.normals().is_none());
    }

    #[test]
    fn test_bounds() {
        let pointcloud = PointCloud::new(
            vec![[1.0, -2.0, 3.0], [-1.0, 4.0, 0.5], [0.0, 0.0, 9.0]],
            None,
            None,
        );
        assert_eq!(pointcloud.min_bound(), Some([-1.0, -2.0, 0.5]));
        assert_eq!(pointcloud.max_bound(), Some([1.0, 4.0, 9.0]));

        let empty = PointCloud::new(vec![], None, None);
        assert_eq!(empty.min_bound(), None);
        assert_eq!(empty.max_bound(), None);
    }
}
