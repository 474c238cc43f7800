/// Texture filtering mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

/// Texture coordinate wrapping mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
}

/// How a backend should sample a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerParams {
    pub filter: Filter,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
    pub mipmaps: bool,
}

impl SamplerParams {
    /// Power-of-two images repeat and get mipmaps; anything else is clamped
    /// to the edge without mipmaps.
    pub fn for_size(width: u32, height: u32, filter: Filter) -> Self {
        let pot = width.is_power_of_two() && height.is_power_of_two();
        let wrap = if pot { Wrap::Repeat } else { Wrap::ClampToEdge };
        Self {
            filter,
            wrap_s: wrap,
            wrap_t: wrap,
            mipmaps: pot,
        }
    }
}

/// Decoded RGBA8 pixels ready to hand to a [`RenderBackend`](crate::RenderBackend).
#[derive(Clone, Debug)]
pub struct Texture {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub sampler: SamplerParams,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32, filter: Filter) -> Self {
        Self {
            pixels,
            width,
            height,
            sampler: SamplerParams::for_size(width, height, filter),
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) from memory.
    pub fn from_bytes(bytes: &[u8], filter: Filter) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(img.into_raw(), width, height, filter))
    }

    /// A single opaque white pixel, bound for untextured meshes.
    pub fn white() -> Self {
        Self::from_rgba(vec![255; 4], 1, 1, Filter::Linear)
    }
}
