use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use serde::Deserialize;

use crate::transforms::{
    quaternion_from_slice, quaternion_to_rotation_matrix, Transform4x4, TransformError,
};

/// Error types for the pose table module.
#[derive(Debug, thiserror::Error)]
pub enum PoseTableError {
    /// Error reading the pose table file
    #[error("error reading pose table")]
    Io(#[from] std::io::Error),

    /// Error parsing the JSON document
    #[error("failed to parse pose table: {0}")]
    Json(#[from] serde_json::Error),

    /// The rotation quaternion of a record does not have four components
    #[error("malformed rotation_quaternion for {key}: expected 4 components, got {len}")]
    MalformedQuaternion {
        /// Image key of the offending record.
        key: String,
        /// Number of components found.
        len: usize,
    },

    /// The translation of a record does not have three components
    #[error("malformed translation for {key}: expected 3 components, got {len}")]
    MalformedTranslation {
        /// Image key of the offending record.
        key: String,
        /// Number of components found.
        len: usize,
    },
}

/// The pose of a single capture frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRecord {
    /// Camera position in world coordinates.
    pub translation: [f64; 3],
    /// Camera orientation as a quaternion in `(w, x, y, z)` order.
    pub rotation_quaternion: [f64; 4],
}

impl PoseRecord {
    /// Compute the camera-to-world transform of this pose.
    pub fn camera_to_world(&self) -> Transform4x4 {
        let rotation = quaternion_to_rotation_matrix(&self.rotation_quaternion);
        Transform4x4::from_rotation_translation(&rotation, &self.translation)
    }
}

// NOTE: components are read as vectors so that a wrong count can be reported with its key.
#[derive(Deserialize)]
struct RawPoseRecord {
    translation: Vec<f64>,
    rotation_quaternion: Vec<f64>,
}

/// Mapping from image filename to its pose.
///
/// Keys iterate in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseTable {
    records: BTreeMap<String, PoseRecord>,
}

impl PoseTable {
    /// Create a pose table from its records.
    pub fn new(records: BTreeMap<String, PoseRecord>) -> Self {
        Self { records }
    }

    /// Get the number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the pose table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up the pose of an image.
    pub fn get(&self, key: &str) -> Option<&PoseRecord> {
        self.records.get(key)
    }

    /// Iterate the image keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Insert or replace the pose of an image.
    pub fn insert(&mut self, key: impl Into<String>, record: PoseRecord) -> Option<PoseRecord> {
        self.records.insert(key.into(), record)
    }
}

/// Parse a pose table from a JSON reader.
///
/// The document is an object mapping image filenames to records with a `translation`
/// (3 numbers) and a `rotation_quaternion` (4 numbers, `w, x, y, z`). Extra fields are
/// ignored.
pub fn parse_pose_table<R: Read>(reader: R) -> Result<PoseTable, PoseTableError> {
    let raw: BTreeMap<String, RawPoseRecord> = serde_json::from_reader(reader)?;

    let records = raw
        .into_iter()
        .map(|(key, record)| {
            let translation: [f64; 3] = record.translation.as_slice().try_into().map_err(|_| {
                PoseTableError::MalformedTranslation {
                    key: key.clone(),
                    len: record.translation.len(),
                }
            })?;
            let rotation_quaternion = quaternion_from_slice(&record.rotation_quaternion)
                .map_err(|TransformError::MalformedQuaternion(len)| {
                    PoseTableError::MalformedQuaternion {
                        key: key.clone(),
                        len,
                    }
                })?;
            Ok((
                key,
                PoseRecord {
                    translation,
                    rotation_quaternion,
                },
            ))
        })
        .collect::<Result<BTreeMap<_, _>, PoseTableError>>()?;

    Ok(PoseTable::new(records))
}

/// Read the poses.json file and return its pose table.
///
/// # Arguments
///
/// * `path` - The path to the poses.json file.
pub fn read_pose_table(path: impl AsRef<Path>) -> Result<PoseTable, PoseTableError> {
    let file = File::open(path)?;
    parse_pose_table(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const POSES: &str = r#"{
        "b.jpg": {"translation": [1.0, 2.0, 3.0], "rotation_quaternion": [1.0, 0.0, 0.0, 0.0]},
        "a.jpg": {"translation": [0.0, 0.0, 0.0], "rotation_quaternion": [0.0, 1.0, 0.0, 0.0], "timestamp": 12.5},
        "c.jpg": {"translation": [-1, 0.5, 2], "rotation_quaternion": [0.5, 0.5, 0.5, 0.5]}
    }"#;

    #[test]
    fn test_parse_pose_table() -> Result<(), PoseTableError> {
        let table = parse_pose_table(POSES.as_bytes())?;
        assert_eq!(table.len(), 3);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["a.jpg", "b.jpg", "c.jpg"]);

        let record = table.get("c.jpg").expect("c.jpg is present");
        assert_eq!(record.translation, [-1.0, 0.5, 2.0]);
        assert_eq!(record.rotation_quaternion, [0.5, 0.5, 0.5, 0.5]);
        Ok(())
    }

    #[test]
    fn test_malformed_quaternion() {
        let doc = r#"{"x.jpg": {"translation": [0, 0, 0], "rotation_quaternion": [1, 0, 0]}}"#;
        match parse_pose_table(doc.as_bytes()) {
            Err(PoseTableError::MalformedQuaternion { key, len }) => {
                assert_eq!(key, "x.jpg");
                assert_eq!(len, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_translation() {
        let doc = r#"{"y.jpg": {"translation": [0, 0], "rotation_quaternion": [1, 0, 0, 0]}}"#;
        assert!(matches!(
            parse_pose_table(doc.as_bytes()),
            Err(PoseTableError::MalformedTranslation { len: 2, .. })
        ));
    }

    #[test]
    fn test_missing_field() {
        let doc = r#"{"z.jpg": {"translation": [0, 0, 0]}}"#;
        assert!(matches!(
            parse_pose_table(doc.as_bytes()),
            Err(PoseTableError::Json(_))
        ));
    }

    #[test]
    fn test_camera_to_world() {
        let record = PoseRecord {
            translation: [1.0, 2.0, 3.0],
            rotation_quaternion: [1.0, 0.0, 0.0, 0.0],
        };
        let transform = record.camera_to_world();
        assert_eq!(transform.translation(), [1.0, 2.0, 3.0]);
        assert_eq!(
            transform.rotation(),
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn test_read_pose_table() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(POSES.as_bytes())?;
        let table = read_pose_table(file.path())?;
        assert_eq!(table.len(), 3);
        Ok(())
    }
}
