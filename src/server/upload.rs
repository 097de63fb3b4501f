use axum::Json;
use axum::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::data::{self, DataAttachment};

use super::errors::ServerError;
use super::models::DetectRequest;

const IMAGE_FIELD: &str = "image";
const BACKEND_FIELD: &str = "backend";

/// An image posted for detection, either as a multipart `image` field or as
/// a JSON body carrying base64 data.
#[derive(Debug, Default)]
pub(crate) struct DetectUpload {
    pub(crate) bytes: Option<Vec<u8>>,
    pub(crate) mime: Option<String>,
    pub(crate) backend: Option<String>,
}

impl DetectUpload {
    pub(crate) fn from_json(payload: DetectRequest) -> Result<Self, ServerError> {
        let bytes = match payload
            .data_base64
            .as_deref()
            .map(strip_data_uri)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(encoded) => Some(BASE64.decode(encoded).map_err(|err| {
                ServerError::bad_request(format!("invalid base64 image data: {}", err))
            })?),
            None => None,
        };
        Ok(Self {
            bytes,
            mime: payload.data_mime,
            backend: payload.backend,
        })
    }

    pub(crate) async fn from_multipart(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut upload = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ServerError::bad_request(err.body_text()))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some(IMAGE_FIELD) => {
                    upload.mime = field
                        .content_type()
                        .filter(|mime| mime.starts_with("image/"))
                        .map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|err| ServerError::bad_request(err.body_text()))?;
                    upload.bytes = Some(bytes.to_vec());
                }
                Some(BACKEND_FIELD) => {
                    let backend = field
                        .text()
                        .await
                        .map_err(|err| ServerError::bad_request(err.body_text()))?;
                    upload.backend = Some(backend);
                }
                _ => {}
            }
        }
        Ok(upload)
    }

    pub(crate) fn into_image(self) -> Result<DataAttachment, ServerError> {
        let bytes = self
            .bytes
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| ServerError::bad_request("No image file provided"))?;
        data::load_image_from_bytes(bytes, self.mime.as_deref())
            .map_err(|err| ServerError::bad_request(err.to_string()))
    }
}

#[async_trait]
impl<S> FromRequest<S> for DetectUpload
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|err| ServerError::bad_request(err.body_text()))?;
            return Self::from_multipart(multipart).await;
        }
        let Json(payload) = Json::<DetectRequest>::from_request(req, state)
            .await
            .map_err(|err| ServerError::bad_request(err.body_text()))?;
        Self::from_json(payload)
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn strip_data_uri(value: &str) -> &str {
    match value.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => value,
    }
}
