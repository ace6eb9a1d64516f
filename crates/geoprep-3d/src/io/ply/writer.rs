use std::io::{BufWriter, Write};
use std::path::Path;

use super::{PlyDataType, PlyError};
use crate::pointcloud::PointCloud;

fn write_header<W: Write>(writer: &mut W, pointcloud: &PointCloud) -> Result<(), PlyError> {
    let float = PlyDataType::Float64.name();
    let uchar = PlyDataType::UInt8.name();

    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "element vertex {}", pointcloud.len())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property {} {}", float, axis)?;
    }
    if pointcloud.colors().is_some() {
        for channel in ["red", "green", "blue"] {
            writeln!(writer, "property {} {}", uchar, channel)?;
        }
    }
    if pointcloud.normals().is_some() {
        for axis in ["nx", "ny", "nz"] {
            writeln!(writer, "property {} {}", float, axis)?;
        }
    }
    writeln!(writer, "end_header")?;
    Ok(())
}

/// Write a point cloud as a binary little-endian PLY stream.
///
/// Points and normals are stored as `double`, colors as `uchar`. Colors and normals are only
/// written when the point cloud carries them.
pub fn write_ply_to_writer<W: Write>(
    writer: &mut W,
    pointcloud: &PointCloud,
) -> Result<(), PlyError> {
    write_header(writer, pointcloud)?;

    for (i, point) in pointcloud.points().iter().enumerate() {
        for value in point {
            writer.write_all(&value.to_le_bytes())?;
        }
        if let Some(colors) = pointcloud.colors() {
            writer.write_all(&colors[i])?;
        }
        if let Some(normals) = pointcloud.normals() {
            for value in normals[i] {
                writer.write_all(&value.to_le_bytes())?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Write a point cloud to a PLY file in binary little-endian format.
///
/// # Arguments
///
/// * `path` - The path to the output PLY file.
/// * `pointcloud` - The point cloud to write.
pub fn write_ply(path: impl AsRef<Path>, pointcloud: &PointCloud) -> Result<(), PlyError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_ply_to_writer(&mut writer, pointcloud)
}
