//! Request field extraction.
//!
//! [`RequestFields`] collects everything the parser may read from a request
//! into a [`RawRequest`]: the query string, urlencoded or multipart form
//! fields, and multipart file parts.

use std::collections::HashMap;

use axum::{
    Form,
    extract::{FromRequest, Multipart, Query, Request},
    http::header::CONTENT_TYPE,
};

use crate::error::AppError;
use crate::models::UploadedFile;
use crate::parser::RawRequest;

/// Raw request fields, ready for parsing.
#[derive(Debug)]
pub struct RequestFields(pub RawRequest);

impl<S> FromRequest<S> for RequestFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let mut raw = RawRequest {
            query,
            ..RawRequest::default()
        };

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            read_multipart(&mut multipart, &mut raw).await?;
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            raw.form.extend(pairs);
        } else if !content_type.is_empty() {
            return Err(AppError::BadRequest(format!(
                "unsupported content type: {content_type}"
            )));
        }

        Ok(Self(raw))
    }
}

async fn read_multipart(multipart: &mut Multipart, raw: &mut RawRequest) -> Result<(), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match field.file_name().map(str::to_owned) {
            // Browsers send an empty, unnamed part when no file was chosen.
            Some(filename) if filename.is_empty() => {}
            Some(filename) => {
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                raw.files.insert(
                    name,
                    UploadedFile::new(filename, content_type, bytes.to_vec()),
                );
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                raw.form.insert(name, text);
            }
        }
    }
    Ok(())
}
