//! Server icon embedded in the status reply.
//!
//! Only the PNG header is inspected: the signature and the dimensions in
//! the IHDR chunk. The image data itself is passed to clients untouched.

use crate::protocol::{DecodeError, Decoder};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::{io, path::Path};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
const IHDR: [u8; 4] = *b"IHDR";

#[derive(Debug, thiserror::Error)]
pub enum FaviconError {
    #[error("not a PNG image")]
    NotPng,
    #[error("truncated PNG header: {0}")]
    Truncated(#[from] DecodeError),
    #[error("server icon must be {size}x{size} but is {width}x{height}", size = Favicon::SIZE)]
    WrongSize { width: u32, height: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A validated 64x64 PNG, stored as the data URI clients expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favicon {
    data_uri: String,
}

impl Favicon {
    /// Required width and height in pixels.
    pub const SIZE: u32 = 64;

    pub fn from_png(png: &[u8]) -> Result<Self, FaviconError> {
        let (width, height) = png_dimensions(png)?;
        if (width, height) != (Self::SIZE, Self::SIZE) {
            return Err(FaviconError::WrongSize { width, height });
        }

        Ok(Self {
            data_uri: format!("data:image/png;base64,{}", STANDARD.encode(png)),
        })
    }

    /// Reads the icon at `path`.
    ///
    /// A missing file simply means no icon. Any other problem is logged and
    /// also results in no icon; it never stops the server.
    pub fn load(path: &Path) -> Option<Self> {
        let png = match fs_err::read(path) {
            Ok(png) => png,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Something went wrong while reading the server icon: {e}");
                return None;
            }
        };

        match Self::from_png(&png) {
            Ok(favicon) => {
                tracing::info!("Loaded server icon from {}", path.display());
                Some(favicon)
            }
            Err(e) => {
                tracing::warn!("Ignoring server icon {}: {e}", path.display());
                None
            }
        }
    }

    /// `data:image/png;base64,...`
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

fn png_dimensions(png: &[u8]) -> Result<(u32, u32), FaviconError> {
    let mut decoder = Decoder::new(png);
    if decoder.consume::<8>()? != PNG_SIGNATURE {
        return Err(FaviconError::NotPng);
    }

    let _chunk_length = decoder.read_u32()?;
    if decoder.consume::<4>()? != IHDR {
        return Err(FaviconError::NotPng);
    }

    let width = decoder.read_u32()?;
    let height = decoder.read_u32()?;
    Ok((width, height))
}
