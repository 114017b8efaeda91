use std::time::Duration;

use aws_sdk_s3 as s3;
use aws_sdk_s3::presigning::PresigningConfig;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    i18n::{Lang, t},
};

pub const MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024;
pub const UPLOAD_URL_TTL_SECS: u64 = 900;
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x600/e5e7eb/1f2937?text=Bearions+Product";
const PRODUCT_IMAGE_PREFIX: &str = "product-images";
const PAYMENT_PROOF_PREFIX: &str = "payment-proofs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRejection {
    UnsupportedType,
    TooLarge,
}

impl ImageRejection {
    pub fn into_app_error(self, lang: Lang) -> AppError {
        let key = match self {
            ImageRejection::UnsupportedType => "image.unsupported_type",
            ImageRejection::TooLarge => "image.too_large",
        };
        AppError::BadRequest(t(lang, key).to_string())
    }
}

/// Returns the file extension for an accepted image upload.
pub fn validate_image(content_type: &str, size: u64) -> std::result::Result<&'static str, ImageRejection> {
    let extension = match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => return Err(ImageRejection::UnsupportedType),
    };

    if size > MAX_IMAGE_SIZE {
        return Err(ImageRejection::TooLarge);
    }

    Ok(extension)
}

pub fn product_image_prefix(product_id: Uuid) -> String {
    format!("{}/{}/", PRODUCT_IMAGE_PREFIX, product_id)
}

pub fn product_image_key(product_id: Uuid, image_uuid: Uuid, extension: &str) -> String {
    format!("{}{}.{}", product_image_prefix(product_id), image_uuid, extension)
}

pub fn payment_proof_key(payment_id: Uuid, now: DateTime<Utc>, extension: &str) -> String {
    format!(
        "{}/{}-{}.{}",
        PAYMENT_PROOF_PREFIX,
        payment_id,
        now.timestamp_millis(),
        extension
    )
}

/// True when `url` names an object this payment's upload URL could have
/// produced: the payment's proof prefix followed by a single image file name.
pub fn is_payment_proof_url(assets_url: &str, payment_id: Uuid, url: &str) -> bool {
    let prefix = public_url(assets_url, &format!("{}/{}-", PAYMENT_PROOF_PREFIX, payment_id));
    let Some(file) = url.strip_prefix(&prefix) else {
        return false;
    };

    let Some((stamp, extension)) = file.split_once('.') else {
        return false;
    };
    !stamp.is_empty()
        && stamp.chars().all(|c| c.is_ascii_digit())
        && matches!(extension, "jpg" | "png" | "webp")
}

pub fn public_url(assets_url: &str, key: &str) -> String {
    format!("{}/{}", assets_url.trim_end_matches('/'), key)
}

pub fn category_placeholder(category: &str) -> &'static str {
    match category {
        "Tops" => "https://placehold.co/600x600/e5e7eb/1f2937?text=T-Shirt",
        "Bottoms" => "https://placehold.co/600x600/e5e7eb/1f2937?text=Pants",
        "Accessories" => "https://placehold.co/600x600/e5e7eb/1f2937?text=Accessories",
        "Outerwear" => "https://placehold.co/600x600/e5e7eb/1f2937?text=Jacket",
        _ => PLACEHOLDER_IMAGE,
    }
}

/// Turns a stored image reference into something a browser can load.
pub fn resolve_image_url(stored: Option<&str>, category: &str, assets_url: &str) -> String {
    match stored {
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => url.to_string(),
        Some(path) if path.starts_with(PRODUCT_IMAGE_PREFIX) => public_url(assets_url, path),
        _ => category_placeholder(category).to_string(),
    }
}

pub async fn put_object_url(
    client: &s3::Client,
    bucket: &str,
    key: &str,
    content_type: &str,
) -> Result<String> {
    let expires_in = PresigningConfig::expires_in(Duration::from_secs(UPLOAD_URL_TTL_SECS))
        .map_err(|e| AppError::InternalError(format!("Invalid presigning config: {}", e)))?;

    let presigned_request = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(content_type)
        .presigned(expires_in)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to generate presigned URL: {}", e)))?;

    Ok(presigned_request.uri().into())
}

pub async fn delete_objects_by_prefix(client: &s3::Client, bucket: &str, prefix: &str) -> Result<usize> {
    let mut objects_to_delete = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let mut list_request = client.list_objects_v2().bucket(bucket).prefix(prefix);

        if let Some(token) = continuation_token {
            list_request = list_request.continuation_token(token);
        }

        let response = list_request
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to list objects: {}", e)))?;

        if let Some(contents) = response.contents {
            objects_to_delete.extend(contents.into_iter().filter_map(|object| object.key));
        }

        if !response.is_truncated.unwrap_or(false) {
            break;
        }

        continuation_token = response.next_continuation_token;
    }

    let delete_count = objects_to_delete.len();

    for key in objects_to_delete {
        client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to delete object: {}", e)))?;
    }

    Ok(delete_count)
}
