//! Opaque texture resource handles.
//!
//! The handle declares the texture's native pixel size and format; upload
//! and caching belong to the renderer backend. Native pixel dimensions are
//! never propagated into logical layout; destination rectangles stay in
//! logical units and meet the device scale only inside a backend.

/// Pixel format of a texture's backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, premultiplied alpha
    Rgba8Premultiplied,
    /// 8-bit RGBA, straight alpha
    Rgba8,
    /// 8-bit RGB, no alpha
    Rgb8,
}

/// Opaque id plus declared native pixel geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHandle {
    /// Opaque resource id, assigned by the host
    pub id: u64,
    /// Native width in physical pixels
    pub pixel_width: u32,
    /// Native height in physical pixels
    pub pixel_height: u32,
    /// Pixel format tag
    pub format: PixelFormat,
}

impl TextureHandle {
    pub fn new(id: u64, pixel_width: u32, pixel_height: u32, format: PixelFormat) -> Self {
        Self {
            id,
            pixel_width,
            pixel_height,
            format,
        }
    }
}
