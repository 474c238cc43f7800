//! Typed reads over raw buffer bytes.
//!
//! An accessor says "`count` elements of `shape`, each component a
//! `component_type`, starting at `byte_offset`". [`decode_accessor`] turns
//! that description plus a byte slice into a flat vector of numbers.

use std::str::FromStr;

use crate::error::{LoadError, Result};

/// Scalar type of each component, keyed by its GL enum value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Width of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = LoadError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            5120 => Ok(ComponentType::I8),
            5121 => Ok(ComponentType::U8),
            5122 => Ok(ComponentType::I16),
            5123 => Ok(ComponentType::U16),
            5125 => Ok(ComponentType::U32),
            5126 => Ok(ComponentType::F32),
            other => Err(LoadError::unsupported(format!("component type {other}"))),
        }
    }
}

/// Number and arrangement of components per element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementShape {
    pub fn components(self) -> usize {
        match self {
            ElementShape::Scalar => 1,
            ElementShape::Vec2 => 2,
            ElementShape::Vec3 => 3,
            ElementShape::Vec4 | ElementShape::Mat2 => 4,
            ElementShape::Mat3 => 9,
            ElementShape::Mat4 => 16,
        }
    }
}

impl FromStr for ElementShape {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SCALAR" => Ok(ElementShape::Scalar),
            "VEC2" => Ok(ElementShape::Vec2),
            "VEC3" => Ok(ElementShape::Vec3),
            "VEC4" => Ok(ElementShape::Vec4),
            "MAT2" => Ok(ElementShape::Mat2),
            "MAT3" => Ok(ElementShape::Mat3),
            "MAT4" => Ok(ElementShape::Mat4),
            other => Err(LoadError::unsupported(format!("accessor type {other:?}"))),
        }
    }
}

/// Where and how to read one accessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessorLayout {
    pub component_type: ComponentType,
    pub shape: ElementShape,
    pub count: usize,
    /// Offset of the first element inside the slice handed to the decoder.
    pub byte_offset: usize,
    /// Distance between element starts; `None` means tightly packed.
    pub byte_stride: Option<usize>,
}

impl AccessorLayout {
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.shape.components()
    }

    /// Bytes needed from the start of the slice to read every element.
    pub fn required_len(&self) -> Option<usize> {
        if self.count == 0 {
            return Some(self.byte_offset);
        }
        let stride = self.byte_stride.unwrap_or(self.element_size());
        stride
            .checked_mul(self.count - 1)?
            .checked_add(self.element_size())?
            .checked_add(self.byte_offset)
    }
}

/// Decoded components, flattened element by element.
#[derive(Clone, Debug, PartialEq)]
pub enum AccessorData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl AccessorData {
    /// Number of components (not elements).
    pub fn len(&self) -> usize {
        match self {
            AccessorData::I8(v) => v.len(),
            AccessorData::U8(v) => v.len(),
            AccessorData::I16(v) => v.len(),
            AccessorData::U16(v) => v.len(),
            AccessorData::U32(v) => v.len(),
            AccessorData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `len` zero components, for accessors without a buffer view.
    pub fn zeroed(component_type: ComponentType, len: usize) -> Self {
        match component_type {
            ComponentType::I8 => AccessorData::I8(vec![0; len]),
            ComponentType::U8 => AccessorData::U8(vec![0; len]),
            ComponentType::I16 => AccessorData::I16(vec![0; len]),
            ComponentType::U16 => AccessorData::U16(vec![0; len]),
            ComponentType::U32 => AccessorData::U32(vec![0; len]),
            ComponentType::F32 => AccessorData::F32(vec![0.0; len]),
        }
    }

    /// Every component widened to `f32`, without normalization.
    pub fn into_f32(self) -> Vec<f32> {
        match self {
            AccessorData::F32(v) => v,
            AccessorData::I8(v) => v.into_iter().map(f32::from).collect(),
            AccessorData::U8(v) => v.into_iter().map(f32::from).collect(),
            AccessorData::I16(v) => v.into_iter().map(f32::from).collect(),
            AccessorData::U16(v) => v.into_iter().map(f32::from).collect(),
            AccessorData::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        }
    }

    /// Integer components mapped to `[0, 1]` (unsigned) or `[-1, 1]`
    /// (signed). Floats pass through unchanged.
    pub fn into_normalized_f32(self) -> Vec<f32> {
        match self {
            AccessorData::F32(v) => v,
            AccessorData::I8(v) => v
                .into_iter()
                .map(|x| (f32::from(x) / 127.0).max(-1.0))
                .collect(),
            AccessorData::U8(v) => v.into_iter().map(|x| f32::from(x) / 255.0).collect(),
            AccessorData::I16(v) => v
                .into_iter()
                .map(|x| (f32::from(x) / 32767.0).max(-1.0))
                .collect(),
            AccessorData::U16(v) => v.into_iter().map(|x| f32::from(x) / 65535.0).collect(),
            AccessorData::U32(v) => v
                .into_iter()
                .map(|x| (f64::from(x) / f64::from(u32::MAX)) as f32)
                .collect(),
        }
    }

    /// Unsigned integer components as `u32`, for index buffers.
    pub fn into_indices(self) -> Result<Vec<u32>> {
        match self {
            AccessorData::U8(v) => Ok(v.into_iter().map(u32::from).collect()),
            AccessorData::U16(v) => Ok(v.into_iter().map(u32::from).collect()),
            AccessorData::U32(v) => Ok(v),
            other => Err(LoadError::unsupported(format!(
                "index component type {:?}",
                other.component_type()
            ))),
        }
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            AccessorData::I8(_) => ComponentType::I8,
            AccessorData::U8(_) => ComponentType::U8,
            AccessorData::I16(_) => ComponentType::I16,
            AccessorData::U16(_) => ComponentType::U16,
            AccessorData::U32(_) => ComponentType::U32,
            AccessorData::F32(_) => ComponentType::F32,
        }
    }
}

/// Reads `layout.count` elements out of `bytes`.
///
/// Components are little-endian. A stride smaller than one element, or a
/// read running past the end of `bytes`, is a `MalformedContainer` error.
pub fn decode_accessor(bytes: &[u8], layout: &AccessorLayout) -> Result<AccessorData> {
    let element_size = layout.element_size();
    let stride = layout.byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(LoadError::malformed(format!(
            "byte stride {stride} is smaller than element size {element_size}"
        )));
    }

    let required = layout
        .required_len()
        .ok_or_else(|| LoadError::malformed("accessor size overflows"))?;
    if required > bytes.len() {
        return Err(LoadError::malformed(format!(
            "accessor needs {required} bytes but only {} are available",
            bytes.len()
        )));
    }

    let components = layout.shape.components();
    let component_size = layout.component_type.size();
    let offsets = (0..layout.count).flat_map(move |i| {
        let start = layout.byte_offset + i * stride;
        (0..components).map(move |j| start + j * component_size)
    });

    let data = match layout.component_type {
        ComponentType::I8 => AccessorData::I8(gather(bytes, offsets, i8::from_le_bytes)),
        ComponentType::U8 => AccessorData::U8(gather(bytes, offsets, u8::from_le_bytes)),
        ComponentType::I16 => AccessorData::I16(gather(bytes, offsets, i16::from_le_bytes)),
        ComponentType::U16 => AccessorData::U16(gather(bytes, offsets, u16::from_le_bytes)),
        ComponentType::U32 => AccessorData::U32(gather(bytes, offsets, u32::from_le_bytes)),
        ComponentType::F32 => AccessorData::F32(gather(bytes, offsets, f32::from_le_bytes)),
    };
    Ok(data)
}

/// Reads one `N`-byte value at each offset. Offsets must be in bounds.
fn gather<const N: usize, T>(
    bytes: &[u8],
    offsets: impl Iterator<Item = usize>,
    decode: fn([u8; N]) -> T,
) -> Vec<T> {
    offsets
        .map(|offset| {
            let mut raw = [0u8; N];
            raw.copy_from_slice(&bytes[offset..offset + N]);
            decode(raw)
        })
        .collect()
}
