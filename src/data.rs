use anyhow::{Result, anyhow};

pub const JPEG_MIME: &str = "image/jpeg";

/// An uploaded image and its MIME type.
#[derive(Debug, Clone)]
pub struct DataAttachment {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl DataAttachment {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Builds an image attachment. An explicit `image/*` hint wins; otherwise the
/// type is sniffed from the bytes, and unknown payloads are sent as JPEG.
pub fn load_image_from_bytes(bytes: Vec<u8>, mime_hint: Option<&str>) -> Result<DataAttachment> {
    if bytes.is_empty() {
        return Err(anyhow!("image data is empty"));
    }
    let mime = resolve_image_mime(mime_hint, &bytes)?;
    Ok(DataAttachment { bytes, mime })
}

fn resolve_image_mime(hint: Option<&str>, bytes: &[u8]) -> Result<String> {
    let hint = hint.map(str::trim).filter(|value| !value.is_empty());
    match hint.map(str::to_lowercase) {
        Some(lower) if lower == "auto" || lower == "image" || lower == "image/*" => {
            Ok(sniff_image_mime(bytes).unwrap_or(JPEG_MIME).to_string())
        }
        Some(lower) if lower.starts_with("image/") => Ok(lower),
        Some(other) => Err(anyhow!("unsupported image mime '{}'", other)),
        None => Ok(sniff_image_mime(bytes).unwrap_or(JPEG_MIME).to_string()),
    }
}

pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    let kind = infer::get(bytes)?;
    let detected = kind.mime_type();
    detected.starts_with("image/").then_some(detected)
}
