use std::{
    fmt::Write as _,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::transforms::Transform4x4;

/// Number of whitespace separated tokens in a trajectory line: the frame index and the 16
/// matrix entries.
pub const TOKENS_PER_LINE: usize = 17;

/// Error types for the trajectory module.
#[derive(Debug, thiserror::Error)]
pub enum TrajectoryError {
    /// Error reading or writing the trajectory
    #[error("error reading or writing trajectory")]
    Io(#[from] std::io::Error),

    /// Error parsing a trajectory line
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
}

/// Format a single trajectory line, including the trailing newline.
///
/// The line holds the frame index followed by the 16 matrix entries in row-major order,
/// separated by single spaces. Values use the shortest decimal representation that parses
/// back to the same `f64`, always with a fractional part or an exponent (`1.0`, `-0.5`,
/// `1e-7`).
pub fn format_trajectory_line(frame_index: usize, transform: &Transform4x4) -> String {
    let mut line = String::with_capacity(16 * 20);
    // writing into a String cannot fail
    let _ = write!(line, "{frame_index}");
    for value in transform.row_major() {
        let _ = write!(line, " {value:?}");
    }
    line.push('\n');
    line
}

/// Writes camera-to-world transforms as a keyframe trajectory, one line per frame.
///
/// Lines are written in the order they are given; the writer does not sort. Each line is
/// assembled in memory, written with a single call and flushed, so a reader never observes a
/// partial line.
pub struct TrajectoryWriter<W: Write> {
    writer: W,
    num_lines: usize,
}

impl<W: Write> TrajectoryWriter<W> {
    /// Create a trajectory writer on top of the given destination.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            num_lines: 0,
        }
    }

    /// Write the line of a single frame.
    pub fn write_frame(
        &mut self,
        frame_index: usize,
        transform: &Transform4x4,
    ) -> Result<(), TrajectoryError> {
        let line = format_trajectory_line(frame_index, transform);
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        self.num_lines += 1;
        Ok(())
    }

    /// Write all the frames of an ordered sequence.
    pub fn write_all<'a, I>(&mut self, frames: I) -> Result<(), TrajectoryError>
    where
        I: IntoIterator<Item = (usize, &'a Transform4x4)>,
    {
        for (frame_index, transform) in frames {
            self.write_frame(frame_index, transform)?;
        }
        Ok(())
    }

    /// Number of lines written so far.
    #[inline]
    pub fn num_lines(&self) -> usize {
        self.num_lines
    }

    /// Flush and return the underlying destination.
    pub fn finish(mut self) -> Result<W, TrajectoryError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Write a trajectory file.
///
/// The lines are written to a temporary file next to `path` which is moved into place once
/// every line has been written, so `path` either holds the complete trajectory or is left
/// untouched.
///
/// # Arguments
///
/// * `path` - The destination path of the trajectory file.
/// * `frames` - The frames as `(frame index, transform)` pairs, in output order.
pub fn write_trajectory_file(
    path: impl AsRef<Path>,
    frames: &[(usize, Transform4x4)],
) -> Result<(), TrajectoryError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp_file = tempfile::NamedTempFile::new_in(parent)?;
    let mut writer = TrajectoryWriter::new(BufWriter::new(tmp_file));
    writer.write_all(frames.iter().map(|(i, t)| (*i, t)))?;

    let tmp_file = writer
        .finish()?
        .into_inner()
        .map_err(|e| TrajectoryError::Io(e.into_error()))?;
    tmp_file.persist(path).map_err(|e| e.error)?;

    log::debug!("wrote {} trajectory lines to {}", frames.len(), path.display());

    Ok(())
}

fn parse_trajectory_line(
    line_number: usize,
    line: &str,
) -> Result<(usize, Transform4x4), TrajectoryError> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() != TOKENS_PER_LINE {
        return Err(TrajectoryError::Parse {
            line: line_number,
            message: format!(
                "expected {} tokens, got {}",
                TOKENS_PER_LINE,
                parts.len()
            ),
        });
    }

    let frame_index = parts[0]
        .parse::<usize>()
        .map_err(|e| TrajectoryError::Parse {
            line: line_number,
            message: format!("{}: {}", parts[0], e),
        })?;

    let mut values = [0.0; 16];
    for (value, token) in values.iter_mut().zip(&parts[1..]) {
        *value = token.parse::<f64>().map_err(|e| TrajectoryError::Parse {
            line: line_number,
            message: format!("{}: {}", token, e),
        })?;
    }

    Ok((frame_index, Transform4x4::from_row_major(&values)))
}

/// Read a trajectory file written by [`write_trajectory_file`].
///
/// Empty lines are skipped. Every other line must hold exactly [`TOKENS_PER_LINE`] tokens.
pub fn read_trajectory_file(
    path: impl AsRef<Path>,
) -> Result<Vec<(usize, Transform4x4)>, TrajectoryError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(parse_trajectory_line(i + 1, &line)),
            Err(e) => Some(Err(e.into())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::quaternion_to_rotation_matrix;
    use approx::assert_relative_eq;

    fn identity_with_translation(t: [f64; 3]) -> Transform4x4 {
        let r = quaternion_to_rotation_matrix(&[1.0, 0.0, 0.0, 0.0]);
        Transform4x4::from_rotation_translation(&r, &t)
    }

    #[test]
    fn test_trajectory_format() -> Result<(), TrajectoryError> {
        let mut writer = TrajectoryWriter::new(Vec::new());
        writer.write_frame(0, &Transform4x4::IDENTITY)?;
        writer.write_frame(1, &identity_with_translation([1.0, 2.0, 3.0]))?;
        assert_eq!(writer.num_lines(), 2);

        let output = String::from_utf8(writer.finish()?).expect("utf8 output");
        assert_eq!(
            output,
            "0 1.0 0.0 0.0 0.0 0.0 1.0 0.0 0.0 0.0 0.0 1.0 0.0 0.0 0.0 0.0 1.0\n\
             1 1.0 0.0 0.0 1.0 0.0 1.0 0.0 2.0 0.0 0.0 1.0 3.0 0.0 0.0 0.0 1.0\n"
        );
        Ok(())
    }

    #[test]
    fn test_writer_keeps_given_order() -> Result<(), TrajectoryError> {
        let mut writer = TrajectoryWriter::new(Vec::new());
        let a = identity_with_translation([5.0, 0.0, 0.0]);
        let b = identity_with_translation([6.0, 0.0, 0.0]);
        writer.write_all([(3, &a), (1, &b)])?;

        let output = String::from_utf8(writer.finish()?).expect("utf8 output");
        let indices = output
            .lines()
            .map(|l| l.split(' ').next().unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(indices, vec!["3", "1"]);
        Ok(())
    }

    #[test]
    fn test_line_token_count_and_precision() {
        let r = quaternion_to_rotation_matrix(&[0.9238795325112867, 0.0, 0.3826834323650898, 0.0]);
        let t = Transform4x4::from_rotation_translation(&r, &[1e-7, -123456.789, 0.1]);
        let line = format_trajectory_line(42, &t);

        assert!(line.ends_with('\n'));
        assert!(!line.ends_with("\n\n"));
        let tokens = line.split(' ').collect::<Vec<_>>();
        assert_eq!(tokens.len(), TOKENS_PER_LINE);
        assert_eq!(tokens[0], "42");

        // shortest round-trip representation
        let values = tokens[1..]
            .iter()
            .map(|s| s.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .expect("numeric tokens");
        assert_eq!(values.as_slice(), t.row_major().as_slice());
    }

    #[test]
    fn test_write_read_trajectory_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("KeyFrameTrajectory2.txt");

        let frames = vec![
            (0, Transform4x4::IDENTITY),
            (1, identity_with_translation([1.0, 2.0, 3.0])),
        ];
        write_trajectory_file(&path, &frames)?;

        let read_back = read_trajectory_file(&path)?;
        assert_eq!(read_back.len(), 2);
        for ((i, expected), (j, actual)) in frames.iter().zip(read_back.iter()) {
            assert_eq!(i, j);
            for (a, b) in expected.row_major().iter().zip(actual.row_major().iter()) {
                assert_relative_eq!(a, b);
            }
        }

        // only the trajectory remains in the directory
        assert_eq!(std::fs::read_dir(tmp_dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_read_rejects_short_line() -> Result<(), Box<dyn std::error::Error>> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("bad.txt");
        std::fs::write(&path, "0 1.0 0.0\n")?;

        match read_trajectory_file(&path) {
            Err(TrajectoryError::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let path = Path::new("/nonexistent-geoprep-dir/trajectory.txt");
        let result = write_trajectory_file(path, &[(0, Transform4x4::IDENTITY)]);
        assert!(matches!(result, Err(TrajectoryError::Io(_))));
    }
}
