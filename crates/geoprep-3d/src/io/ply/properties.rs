use super::PlyError;

/// The storage format of the PLY body.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PlyFormat {
    /// Whitespace separated text, one vertex per line.
    Ascii,
    /// Packed little-endian records.
    BinaryLittleEndian,
}

/// A scalar property of the vertex element.
#[derive(Debug, PartialEq, Clone)]
pub struct PlyPropertyDefinition {
    /// Name of the property, e.g. `x` or `red`.
    pub name: String,
    /// Scalar type of the property.
    pub data_type: PlyDataType,
}

/// Scalar types of PLY properties.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PlyDataType {
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// 8-bit signed integer
    Int8,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit signed integer
    Int16,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit signed integer
    Int32,
    /// 32-bit unsigned integer
    UInt32,
}

impl PlyDataType {
    /// Size in bytes of a value in binary storage.
    pub fn size(&self) -> usize {
        match self {
            PlyDataType::Float32 | PlyDataType::Int32 | PlyDataType::UInt32 => 4,
            PlyDataType::Float64 => 8,
            PlyDataType::Int16 | PlyDataType::UInt16 => 2,
            PlyDataType::Int8 | PlyDataType::UInt8 => 1,
        }
    }

    /// Parse a PLY type name, accepting both the classic and the sized spellings.
    pub fn from_name(type_str: &str) -> Result<Self, PlyError> {
        match type_str {
            "float" | "float32" => Ok(PlyDataType::Float32),
            "double" | "float64" => Ok(PlyDataType::Float64),
            "char" | "int8" => Ok(PlyDataType::Int8),
            "uchar" | "uint8" => Ok(PlyDataType::UInt8),
            "short" | "int16" => Ok(PlyDataType::Int16),
            "ushort" | "uint16" => Ok(PlyDataType::UInt16),
            "int" | "int32" => Ok(PlyDataType::Int32),
            "uint" | "uint32" => Ok(PlyDataType::UInt32),
            _ => Err(PlyError::UnsupportedProperty(type_str.to_string())),
        }
    }

    /// The name written in PLY headers.
    pub fn name(&self) -> &'static str {
        match self {
            PlyDataType::Float32 => "float",
            PlyDataType::Float64 => "double",
            PlyDataType::Int8 => "char",
            PlyDataType::UInt8 => "uchar",
            PlyDataType::Int16 => "short",
            PlyDataType::UInt16 => "ushort",
            PlyDataType::Int32 => "int",
            PlyDataType::UInt32 => "uint",
        }
    }

    /// Decode a little-endian value from the start of `bytes`.
    ///
    /// PRECONDITION: `bytes` holds at least [`PlyDataType::size`] bytes.
    pub fn decode_le(&self, bytes: &[u8]) -> PlyValue {
        let mut buf = [0u8; 8];
        buf[..self.size()].copy_from_slice(&bytes[..self.size()]);
        match self {
            PlyDataType::Float32 => {
                PlyValue::Float32(f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            }
            PlyDataType::Float64 => PlyValue::Float64(f64::from_le_bytes(buf)),
            PlyDataType::Int8 => PlyValue::Int8(buf[0] as i8),
            PlyDataType::UInt8 => PlyValue::UInt8(buf[0]),
            PlyDataType::Int16 => PlyValue::Int16(i16::from_le_bytes([buf[0], buf[1]])),
            PlyDataType::UInt16 => PlyValue::UInt16(u16::from_le_bytes([buf[0], buf[1]])),
            PlyDataType::Int32 => {
                PlyValue::Int32(i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            }
            PlyDataType::UInt32 => {
                PlyValue::UInt32(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            }
        }
    }

    /// Parse a value from its ASCII representation.
    pub fn parse_ascii(&self, token: &str) -> Result<PlyValue, PlyError> {
        fn parse<T: std::str::FromStr>(token: &str) -> Result<T, PlyError>
        where
            T::Err: std::fmt::Display,
        {
            token
                .parse::<T>()
                .map_err(|e| PlyError::Parse(format!("{}: {}", token, e)))
        }

        Ok(match self {
            PlyDataType::Float32 => PlyValue::Float32(parse(token)?),
            PlyDataType::Float64 => PlyValue::Float64(parse(token)?),
            PlyDataType::Int8 => PlyValue::Int8(parse(token)?),
            PlyDataType::UInt8 => PlyValue::UInt8(parse(token)?),
            PlyDataType::Int16 => PlyValue::Int16(parse(token)?),
            PlyDataType::UInt16 => PlyValue::UInt16(parse(token)?),
            PlyDataType::Int32 => PlyValue::Int32(parse(token)?),
            PlyDataType::UInt32 => PlyValue::UInt32(parse(token)?),
        })
    }
}

/// A decoded scalar property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlyValue {
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// 8-bit signed integer
    Int8(i8),
    /// 8-bit unsigned integer
    UInt8(u8),
    /// 16-bit signed integer
    Int16(i16),
    /// 16-bit unsigned integer
    UInt16(u16),
    /// 32-bit signed integer
    Int32(i32),
    /// 32-bit unsigned integer
    UInt32(u32),
}

impl PlyValue {
    /// Convert the value to a float.
    pub fn to_f64(self) -> f64 {
        match self {
            PlyValue::Float32(v) => v as f64,
            PlyValue::Float64(v) => v,
            PlyValue::Int8(v) => v as f64,
            PlyValue::UInt8(v) => v as f64,
            PlyValue::Int16(v) => v as f64,
            PlyValue::UInt16(v) => v as f64,
            PlyValue::Int32(v) => v as f64,
            PlyValue::UInt32(v) => v as f64,
        }
    }

    /// Convert the value to an 8-bit color channel.
    ///
    /// Floating point channels are expected in `[0, 1]`.
    pub fn to_color_u8(self) -> u8 {
        match self {
            PlyValue::UInt8(v) => v,
            PlyValue::Int8(v) => v.max(0) as u8,
            PlyValue::Float32(v) => (v * 255.0).round().clamp(0.0, 255.0) as u8,
            PlyValue::Float64(v) => (v * 255.0).round().clamp(0.0, 255.0) as u8,
            other => other.to_f64().clamp(0.0, 255.0) as u8,
        }
    }
}

/// Positions of the well-known vertex properties inside a vertex record.
#[derive(Debug, PartialEq, Clone)]
pub struct VertexLayout {
    /// Indices of `x`, `y`, `z`.
    pub position: [usize; 3],
    /// Indices of `red`, `green`, `blue` when all three are present.
    pub color: Option<[usize; 3]>,
    /// Indices of `nx`, `ny`, `nz` when all three are present.
    pub normal: Option<[usize; 3]>,
}

impl VertexLayout {
    /// Resolve the layout of a vertex element from its property list.
    pub fn from_properties(properties: &[PlyPropertyDefinition]) -> Result<Self, PlyError> {
        let find = |names: [&str; 3]| -> Option<[usize; 3]> {
            let mut indices = [0; 3];
            for (index, name) in indices.iter_mut().zip(names) {
                *index = properties.iter().position(|p| p.name == name)?;
            }
            Some(indices)
        };

        Ok(Self {
            position: find(["x", "y", "z"]).ok_or(PlyError::MissingCoordinates)?,
            color: find(["red", "green", "blue"]),
            normal: find(["nx", "ny", "nz"]),
        })
    }
}
