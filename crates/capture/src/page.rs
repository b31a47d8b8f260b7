//! Page-side execution of the crop.
//!
//! The crop must run where the page's layout information (device pixel
//! ratio) is known, so the dispatcher ships the snapshot and the selection
//! to the originating page by value and awaits the encoded result.

use async_trait::async_trait;
use webaudit_core::crop;
use webaudit_core::types::{ContextId, SelectionRect};

use crate::error::CaptureError;

/// Everything the page needs to crop, passed by value.
#[derive(Debug)]
pub struct CropJob {
    pub bitmap: Vec<u8>,
    pub area: SelectionRect,
}

/// Runs crop jobs inside a page context.
#[async_trait]
pub trait PageExecutor: Send + Sync {
    async fn crop(&self, context: ContextId, job: CropJob) -> Result<Vec<u8>, CaptureError>;
}

/// Executes crops in-process for a page with a known device pixel ratio.
pub struct InProcessPage {
    device_pixel_ratio: f64,
}

impl InProcessPage {
    /// `reported` is the page's own device pixel ratio, if it exposes one.
    pub fn new(reported: Option<f64>) -> Self {
        Self {
            device_pixel_ratio: crop::effective_ratio(reported),
        }
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }
}

#[async_trait]
impl PageExecutor for InProcessPage {
    async fn crop(&self, context: ContextId, job: CropJob) -> Result<Vec<u8>, CaptureError> {
        let ratio = self.device_pixel_ratio;
        tracing::debug!(context, ratio, area = ?job.area, "Cropping in page context");

        // Decoding is the suspension point; keep it off the async workers.
        let cropped = tokio::task::spawn_blocking(move || {
            crop::crop_png(&job.bitmap, &job.area, ratio)
        })
        .await
        .map_err(CaptureError::CropTask)??;

        Ok(cropped)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use image::{Rgba, RgbaImage};
    use webaudit_core::crop::{decode_bitmap, encode_png};
    use webaudit_core::CoreError;

    use super::*;

    #[tokio::test]
    async fn crops_at_page_ratio() {
        let source = RgbaImage::from_fn(200, 200, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let job = CropJob {
            bitmap: encode_png(&source).unwrap(),
            area: SelectionRect::new(10.0, 20.0, 40.0, 30.0),
        };

        let page = InProcessPage::new(Some(2.0));
        let out = decode_bitmap(&page.crop(3, job).await.unwrap()).unwrap();

        assert_eq!(out.dimensions(), (40, 30));
        assert_eq!(out.get_pixel(0, 0), source.get_pixel(20, 40));
    }

    #[test]
    fn missing_ratio_defaults_to_one() {
        assert_eq!(InProcessPage::new(None).device_pixel_ratio(), 1.0);
    }

    #[tokio::test]
    async fn garbage_bitmap_is_a_crop_error() {
        let job = CropJob {
            bitmap: b"garbage".to_vec(),
            area: SelectionRect::new(0.0, 0.0, 20.0, 20.0),
        };
        let result = InProcessPage::new(None).crop(1, job).await;
        assert_matches!(result, Err(CaptureError::Crop(_)));
    }

    #[tokio::test]
    async fn huge_area_is_a_crop_error() {
        let source = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let job = CropJob {
            bitmap: encode_png(&source).unwrap(),
            area: SelectionRect::new(0.0, 0.0, 1e10, 1e10),
        };
        let result = InProcessPage::new(None).crop(1, job).await;
        assert_matches!(result, Err(CaptureError::Crop(CoreError::Validation(_))));
    }
}
