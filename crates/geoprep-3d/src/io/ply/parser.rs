use std::io::{BufRead, Read};
use std::path::Path;

use super::{
    properties::{PlyDataType, PlyFormat, PlyPropertyDefinition, PlyValue, VertexLayout},
    PlyError,
};
use crate::pointcloud::PointCloud;

/// Parsed PLY header of a point cloud file.
#[derive(Debug, PartialEq, Clone)]
pub struct PlyHeader {
    /// Storage format of the body.
    pub format: PlyFormat,
    /// Number of vertices.
    pub vertex_count: usize,
    /// Scalar properties of the vertex element, in storage order.
    pub properties: Vec<PlyPropertyDefinition>,
}

impl PlyHeader {
    /// Size in bytes of a binary vertex record.
    pub fn record_size(&self) -> usize {
        self.properties.iter().map(|p| p.data_type.size()).sum()
    }
}

/// Parse the header of a PLY stream, leaving the reader at the start of the body.
pub fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, PlyError> {
    let mut line = String::new();
    let mut is_ply = false;
    let mut format = None;
    let mut vertex_count = None;
    let mut in_vertex_element = false;
    let mut properties = Vec::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::MalformedHeader(
                "unexpected end of file before end_header".to_string(),
            ));
        }
        let trimmed = line.trim();

        if !is_ply {
            if trimmed != "ply" {
                return Err(PlyError::MalformedHeader("missing ply magic".to_string()));
            }
            is_ply = true;
            continue;
        }

        if trimmed == "end_header" {
            break;
        }

        let parts = trimmed.split_whitespace().collect::<Vec<_>>();
        match parts.as_slice() {
            [] | ["comment", ..] | ["obj_info", ..] => {}
            ["format", kind, _version] => {
                format = Some(match *kind {
                    "ascii" => PlyFormat::Ascii,
                    "binary_little_endian" => PlyFormat::BinaryLittleEndian,
                    other => return Err(PlyError::UnsupportedFormat(other.to_string())),
                });
            }
            ["element", "vertex", count] => {
                let count = count.parse::<usize>().map_err(|e| {
                    PlyError::MalformedHeader(format!("vertex count {}: {}", count, e))
                })?;
                vertex_count = Some(count);
                in_vertex_element = true;
            }
            ["element", name, _count] => {
                // vertex data must come first in the body
                if vertex_count.is_none() {
                    return Err(PlyError::UnsupportedProperty(format!(
                        "element {} before vertex",
                        name
                    )));
                }
                in_vertex_element = false;
            }
            ["property", "list", ..] if in_vertex_element => {
                return Err(PlyError::UnsupportedProperty(trimmed.to_string()));
            }
            ["property", data_type, name] => {
                if in_vertex_element {
                    properties.push(PlyPropertyDefinition {
                        name: name.to_string(),
                        data_type: PlyDataType::from_name(data_type)?,
                    });
                }
            }
            ["property", "list", ..] => {}
            _ => {
                return Err(PlyError::MalformedHeader(format!(
                    "unexpected header line: {}",
                    trimmed
                )));
            }
        }
    }

    let format = format.ok_or_else(|| PlyError::MalformedHeader("missing format".to_string()))?;
    let vertex_count = vertex_count
        .ok_or_else(|| PlyError::MalformedHeader("missing vertex element".to_string()))?;

    Ok(PlyHeader {
        format,
        vertex_count,
        properties,
    })
}

// Upper bound on the vertices reserved up front; the header count is not trusted.
const MAX_RESERVED_VERTICES: usize = 1 << 20;

// Accumulates vertices into a point cloud according to the vertex layout.
struct PointCloudBuilder {
    layout: VertexLayout,
    points: Vec<[f64; 3]>,
    colors: Option<Vec<[u8; 3]>>,
    normals: Option<Vec<[f64; 3]>>,
}

impl PointCloudBuilder {
    fn new(layout: VertexLayout, vertex_count: usize) -> Self {
        let capacity = vertex_count.min(MAX_RESERVED_VERTICES);
        let colors = layout.color.map(|_| Vec::with_capacity(capacity));
        let normals = layout.normal.map(|_| Vec::with_capacity(capacity));
        Self {
            layout,
            points: Vec::with_capacity(capacity),
            colors,
            normals,
        }
    }

    fn push(&mut self, values: &[PlyValue]) {
        let [x, y, z] = self.layout.position;
        self.points
            .push([values[x].to_f64(), values[y].to_f64(), values[z].to_f64()]);

        if let (Some(colors), Some([r, g, b])) = (self.colors.as_mut(), self.layout.color) {
            colors.push([
                values[r].to_color_u8(),
                values[g].to_color_u8(),
                values[b].to_color_u8(),
            ]);
        }

        if let (Some(normals), Some([nx, ny, nz])) = (self.normals.as_mut(), self.layout.normal) {
            normals.push([
                values[nx].to_f64(),
                values[ny].to_f64(),
                values[nz].to_f64(),
            ]);
        }
    }

    fn build(self) -> PointCloud {
        PointCloud::new(self.points, self.colors, self.normals)
    }
}

fn read_binary_body<R: Read>(
    reader: &mut R,
    header: &PlyHeader,
    builder: &mut PointCloudBuilder,
) -> Result<(), PlyError> {
    let mut buffer = vec![0u8; header.record_size()];
    let mut values = Vec::with_capacity(header.properties.len());

    for _ in 0..header.vertex_count {
        reader.read_exact(&mut buffer)?;
        values.clear();
        let mut offset = 0;
        for property in header.properties.iter() {
            values.push(property.data_type.decode_le(&buffer[offset..]));
            offset += property.data_type.size();
        }
        builder.push(&values);
    }

    Ok(())
}

fn read_ascii_body<R: BufRead>(
    reader: &mut R,
    header: &PlyHeader,
    builder: &mut PointCloudBuilder,
) -> Result<(), PlyError> {
    let mut line = String::new();
    let mut values = Vec::with_capacity(header.properties.len());
    let mut num_read = 0;

    while num_read < header.vertex_count {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::Parse(format!(
                "expected {} vertices, found {}",
                header.vertex_count, num_read
            )));
        }
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() != header.properties.len() {
            return Err(PlyError::Parse(format!(
                "vertex {} has {} values, expected {}",
                num_read,
                tokens.len(),
                header.properties.len()
            )));
        }

        values.clear();
        for (property, token) in header.properties.iter().zip(tokens) {
            values.push(property.data_type.parse_ascii(token)?);
        }
        builder.push(&values);
        num_read += 1;
    }

    Ok(())
}

/// Read a point cloud from a PLY stream.
///
/// Supports `ascii` and `binary_little_endian` bodies with any combination of scalar vertex
/// properties. Colors and normals are returned when the vertex element defines
/// `red, green, blue` and `nx, ny, nz` respectively.
pub fn read_ply_from_reader<R: BufRead>(reader: &mut R) -> Result<PointCloud, PlyError> {
    let header = parse_header(reader)?;
    let layout = VertexLayout::from_properties(&header.properties)?;
    let mut builder = PointCloudBuilder::new(layout, header.vertex_count);

    match header.format {
        PlyFormat::BinaryLittleEndian => read_binary_body(reader, &header, &mut builder)?,
        PlyFormat::Ascii => read_ascii_body(reader, &header, &mut builder)?,
    }

    Ok(builder.build())
}

/// Read a point cloud from a PLY file.
///
/// # Arguments
///
/// * `path` - The path to the PLY file.
///
/// # Returns
///
/// The point cloud with its optional colors and normals.
pub fn read_ply(path: impl AsRef<Path>) -> Result<PointCloud, PlyError> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    read_ply_from_reader(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const XYZ_RGB_NORMALS: &str = "ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nproperty float nx\nproperty float ny\nproperty float nz\nend_header\n";

    #[test]
    fn test_parse_header_basic() -> Result<(), PlyError> {
        let header_text = "ply\nformat binary_little_endian 1.0\ncomment made by hand\nelement vertex 10\nproperty float x\nproperty float y\nproperty float z\nend_header\n";
        let mut reader = std::io::BufReader::new(header_text.as_bytes());
        let header = parse_header(&mut reader)?;
        assert_eq!(header.format, PlyFormat::BinaryLittleEndian);
        assert_eq!(header.vertex_count, 10);
        assert_eq!(header.properties.len(), 3);
        assert_eq!(header.properties[0].name, "x");
        assert_eq!(header.properties[0].data_type, PlyDataType::Float32);
        assert_eq!(header.record_size(), 12);
        Ok(())
    }

    #[test]
    fn test_parse_header_ignores_trailing_elements() -> Result<(), PlyError> {
        let header_text = "ply\nformat ascii 1.0\nelement vertex 3\nproperty double x\nproperty double y\nproperty double z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n";
        let mut reader = std::io::BufReader::new(header_text.as_bytes());
        let header = parse_header(&mut reader)?;
        assert_eq!(header.format, PlyFormat::Ascii);
        assert_eq!(header.properties.len(), 3);
        Ok(())
    }

    #[test]
    fn test_parse_header_errors() {
        let big_endian = "ply\nformat binary_big_endian 1.0\nelement vertex 1\nproperty float x\nend_header\n";
        let mut reader = std::io::BufReader::new(big_endian.as_bytes());
        assert!(matches!(
            parse_header(&mut reader),
            Err(PlyError::UnsupportedFormat(_))
        ));

        let not_ply = "obj\n";
        let mut reader = std::io::BufReader::new(not_ply.as_bytes());
        assert!(matches!(
            parse_header(&mut reader),
            Err(PlyError::MalformedHeader(_))
        ));

        let truncated = "ply\nformat ascii 1.0\nelement vertex 1\n";
        let mut reader = std::io::BufReader::new(truncated.as_bytes());
        assert!(matches!(
            parse_header(&mut reader),
            Err(PlyError::MalformedHeader(_))
        ));

        let list_vertex = "ply\nformat ascii 1.0\nelement vertex 1\nproperty list uchar float x\nend_header\n";
        let mut reader = std::io::BufReader::new(list_vertex.as_bytes());
        assert!(matches!(
            parse_header(&mut reader),
            Err(PlyError::UnsupportedProperty(_))
        ));
    }

    #[test]
    fn test_read_ply_binary_xyz_rgb_normals() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        file.write_all(XYZ_RGB_NORMALS.as_bytes())?;

        let mut data = Vec::new();
        data.extend_from_slice(&1.0f32.to_le_bytes());
        data.extend_from_slice(&2.0f32.to_le_bytes());
        data.extend_from_slice(&3.0f32.to_le_bytes());
        data.push(255);
        data.push(128);
        data.push(0);
        data.extend_from_slice(&0.0f32.to_le_bytes());
        data.extend_from_slice(&1.0f32.to_le_bytes());
        data.extend_from_slice(&0.0f32.to_le_bytes());
        file.write_all(&data)?;

        let pointcloud = read_ply(file.path())?;
        assert_eq!(pointcloud.len(), 1);
        assert_eq!(pointcloud.points()[0], [1.0, 2.0, 3.0]);
        assert_eq!(pointcloud.colors().map(|c| c[0]), Some([255, 128, 0]));
        assert_eq!(pointcloud.normals().map(|n| n[0]), Some([0.0, 1.0, 0.0]));
        Ok(())
    }

    #[test]
    fn test_read_ply_binary_without_attributes() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        let header = "ply\nformat binary_little_endian 1.0\nelement vertex 2\nproperty double x\nproperty double y\nproperty double z\nproperty float intensity\nend_header\n";
        file.write_all(header.as_bytes())?;

        let mut data = Vec::new();
        for value in [1.0f64, 2.0, 3.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&0.5f32.to_le_bytes());
        for value in [-1.0f64, -2.0, -3.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&0.25f32.to_le_bytes());
        file.write_all(&data)?;

        let pointcloud = read_ply(file.path())?;
        assert_eq!(pointcloud.points(), &[[1.0, 2.0, 3.0], [-1.0, -2.0, -3.0]]);
        assert!(pointcloud.colors().is_none());
        assert!(pointcloud.normals().is_none());
        Ok(())
    }

    #[test]
    fn test_read_ply_binary_truncated() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        file.write_all(XYZ_RGB_NORMALS.replace("vertex 1", "vertex 2").as_bytes())?;
        file.write_all(&[0u8; 27])?;

        assert!(matches!(read_ply(file.path()), Err(PlyError::Io(_))));
        Ok(())
    }

    #[test]
    fn test_read_ply_oversized_vertex_count() {
        let binary = format!(
            "ply\nformat binary_little_endian 1.0\nelement vertex {}\nproperty float x\nproperty float y\nproperty float z\nend_header\n",
            usize::MAX
        );
        let mut reader = std::io::BufReader::new(binary.as_bytes());
        assert!(matches!(
            read_ply_from_reader(&mut reader),
            Err(PlyError::Io(_))
        ));

        let ascii = "ply\nformat ascii 1.0\nelement vertex 100000000000\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        let mut reader = std::io::BufReader::new(ascii.as_bytes());
        assert!(matches!(
            read_ply_from_reader(&mut reader),
            Err(PlyError::Parse(_))
        ));
    }

    #[test]
    fn test_read_ply_ascii() -> Result<(), PlyError> {
        let text = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n0.5 1 -2 10 20 30\n\n3 4 5 40 50 60\n";
        let mut reader = std::io::BufReader::new(text.as_bytes());
        let pointcloud = read_ply_from_reader(&mut reader)?;
        assert_eq!(pointcloud.points(), &[[0.5, 1.0, -2.0], [3.0, 4.0, 5.0]]);
        assert_eq!(
            pointcloud.colors(),
            Some(&[[10, 20, 30], [40, 50, 60]][..])
        );
        assert!(pointcloud.normals().is_none());
        Ok(())
    }

    #[test]
    fn test_read_ply_ascii_errors() {
        let short = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        let mut reader = std::io::BufReader::new(short.as_bytes());
        assert!(matches!(
            read_ply_from_reader(&mut reader),
            Err(PlyError::Parse(_))
        ));

        let bad_token = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 two 3\n";
        let mut reader = std::io::BufReader::new(bad_token.as_bytes());
        assert!(matches!(
            read_ply_from_reader(&mut reader),
            Err(PlyError::Parse(_))
        ));
    }
}
