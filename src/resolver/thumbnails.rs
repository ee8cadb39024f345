//! Thumbnail backfill for resolved properties.
//!
//! Missing variants are derived from the local primary image through media-host
//! URL transformations, or copied from whichever variant the record already has.

use crate::models::{MergedProperty, Thumbnails};

const SMALL_TRANSFORM: &str = "c_fill,w_400,h_300,q_auto,f_auto";
const MEDIUM_TRANSFORM: &str = "c_fill,w_800,h_600,q_auto,f_auto";
const LARGE_TRANSFORM: &str = "c_fill,w_1600,h_1200,q_auto,f_auto";

/// Insert a transformation segment after `/upload/` in a media-host delivery URL.
/// URLs from other hosts are returned unchanged.
pub fn transform_url(url: &str, transformation: &str) -> String {
    match url.split_once("/upload/") {
        Some((base, rest)) => format!("{}/upload/{}/{}", base, transformation, rest),
        None => url.to_string(),
    }
}

/// Thumbnail variants derived from one source image.
pub fn derive_from_image(url: &str) -> Thumbnails {
    Thumbnails {
        thumbnail_url: Some(transform_url(url, SMALL_TRANSFORM)),
        thumbnail_url_medium: Some(transform_url(url, MEDIUM_TRANSFORM)),
        thumbnail_url_large: Some(transform_url(url, LARGE_TRANSFORM)),
    }
}

/// Fill the variants missing from `current`. Returns `None` when there is
/// nothing to derive from.
pub fn fill_missing(current: &Thumbnails, primary_image: Option<&str>) -> Option<Thumbnails> {
    let derived = match primary_image {
        Some(url) => derive_from_image(url),
        None => {
            let any = current
                .thumbnail_url_large
                .clone()
                .or_else(|| current.thumbnail_url_medium.clone())
                .or_else(|| current.thumbnail_url.clone())?;
            Thumbnails {
                thumbnail_url: Some(any.clone()),
                thumbnail_url_medium: Some(any.clone()),
                thumbnail_url_large: Some(any),
            }
        }
    };

    Some(Thumbnails {
        thumbnail_url: current.thumbnail_url.clone().or(derived.thumbnail_url),
        thumbnail_url_medium: current
            .thumbnail_url_medium
            .clone()
            .or(derived.thumbnail_url_medium),
        thumbnail_url_large: current
            .thumbnail_url_large
            .clone()
            .or(derived.thumbnail_url_large),
    })
}

/// Backfill missing thumbnails on a resolved property, best effort.
pub fn backfill(property: &mut MergedProperty) {
    let current = property.thumbnails();
    if current.is_complete() {
        return;
    }

    let primary = property
        .local_data()
        .and_then(|local| local.primary_image())
        .map(|img| img.url.clone());

    match fill_missing(&current, primary.as_deref()) {
        Some(filled) => property.set_thumbnails(filled),
        None => tracing::debug!("No source available to backfill thumbnails"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: &str = "https://res.cloudinary.com/demo/image/upload/v1700/rentals/cabin.jpg";

    #[test]
    fn test_transform_url_inserts_segment() {
        assert_eq!(
            transform_url(IMAGE, "w_400"),
            "https://res.cloudinary.com/demo/image/upload/w_400/v1700/rentals/cabin.jpg"
        );
        assert_eq!(
            transform_url("https://cdn.example.com/cabin.jpg", "w_400"),
            "https://cdn.example.com/cabin.jpg"
        );
    }

    #[test]
    fn test_fill_missing_keeps_existing_variants() {
        let current = Thumbnails {
            thumbnail_url: Some("https://upstream/small.jpg".to_string()),
            thumbnail_url_medium: None,
            thumbnail_url_large: None,
        };

        let filled = fill_missing(&current, Some(IMAGE)).unwrap();

        assert_eq!(filled.thumbnail_url.as_deref(), Some("https://upstream/small.jpg"));
        assert!(filled.thumbnail_url_medium.unwrap().contains("w_800"));
        assert!(filled.thumbnail_url_large.unwrap().contains("w_1600"));
    }

    #[test]
    fn test_fill_missing_copies_present_variant_without_image() {
        let current = Thumbnails {
            thumbnail_url: None,
            thumbnail_url_medium: Some("https://upstream/medium.jpg".to_string()),
            thumbnail_url_large: None,
        };

        let filled = fill_missing(&current, None).unwrap();
        assert!(filled.is_complete());
        assert_eq!(filled.thumbnail_url.as_deref(), Some("https://upstream/medium.jpg"));
    }

    #[test]
    fn test_fill_missing_without_any_source() {
        assert!(fill_missing(&Thumbnails::default(), None).is_none());
    }
}
