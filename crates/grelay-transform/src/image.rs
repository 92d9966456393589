use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use grelay_protocol::openai::{ChatCompletionRequest, ContentPart, MessageContent};

use crate::error::TransformError;

/// Inline image ready to be placed into a Claude `image` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub media_type: String,
    /// Base64 payload without the `data:` header.
    pub data: String,
}

impl ImageData {
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            data: STANDARD.encode(bytes),
        }
    }
}

/// Remote images fetched ahead of translation, keyed by their URL.
pub type ResolvedImages = HashMap<String, ImageData>;

pub fn is_remote_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Every distinct `http(s)` image URL referenced by the request, in order.
pub fn remote_image_urls(request: &ChatCompletionRequest) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for message in &request.messages {
        let Some(MessageContent::Parts(parts)) = &message.content else {
            continue;
        };
        for part in parts {
            if let ContentPart::ImageUrl { image_url } = part
                && is_remote_url(&image_url.url)
                && !urls.contains(&image_url.url)
            {
                urls.push(image_url.url.clone());
            }
        }
    }
    urls
}

/// Decodes an inline image reference.
///
/// Accepts `data:<mime>;base64,<payload>` as well as a bare base64 payload.
/// The payload must decode; a missing mime type is sniffed from the bytes.
pub fn parse_data_url(url: &str) -> Result<ImageData, TransformError> {
    let (declared, payload) = match url.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| TransformError::InvalidImageData("missing ',' in data url".into()))?;
            let mime = meta.strip_suffix(";base64").ok_or_else(|| {
                TransformError::InvalidImageData("data url is not base64 encoded".into())
            })?;
            (Some(mime.trim()).filter(|mime| !mime.is_empty()), payload)
        }
        None => (None, url),
    };

    let payload = payload.trim();
    let bytes = STANDARD
        .decode(payload)
        .map_err(|err| TransformError::InvalidImageData(err.to_string()))?;
    if bytes.is_empty() {
        return Err(TransformError::InvalidImageData("empty image payload".into()));
    }

    let media_type = match declared {
        Some(mime) => mime.to_string(),
        None => sniff_media_type(&bytes)
            .ok_or_else(|| TransformError::InvalidImageData("unknown image format".into()))?
            .to_string(),
    };

    Ok(ImageData {
        media_type,
        data: payload.to_string(),
    })
}

/// Media type from the leading magic bytes of an image.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
