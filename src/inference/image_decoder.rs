use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat};
use tracing::debug;

use crate::error::PipelineError;
use crate::inference::tensor::{NormalizedTensor, IMAGE_SIDE};

const SUPPORTED_FORMATS: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Bmp];

/// Decodes an uploaded JPEG, PNG or BMP into the classifier's input tensor.
///
/// The format is sniffed from the content itself, the upload's filename and
/// content type are never trusted. Photographed digits are usually dark ink on
/// light paper while the model was trained on bright strokes over a black
/// background, so the grayscale image is always inverted.
pub fn decode_image(bytes: &[u8]) -> Result<NormalizedTensor, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let format = image::guess_format(bytes).map_err(|_| PipelineError::UnsupportedFormat)?;
    if !SUPPORTED_FORMATS.contains(&format) {
        debug!("rejecting upload in {format:?} format");
        return Err(PipelineError::UnsupportedFormat);
    }

    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|_| PipelineError::UnsupportedFormat)?;
    debug!(
        "decoded {format:?} image of {}x{}",
        image.width(),
        image.height()
    );

    let grid = to_digit_grid(&image.to_luma8());
    NormalizedTensor::from_intensities(grid.into_raw().into_iter().map(f32::from).collect())
}

fn to_digit_grid(gray: &GrayImage) -> GrayImage {
    let side = IMAGE_SIDE as u32;
    let mut grid = imageops::resize(gray, side, side, FilterType::CatmullRom);
    imageops::invert(&mut grid);
    grid
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, Luma, Rgb, RgbImage};

    use super::*;
    use crate::inference::tensor::INPUT_SHAPE;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn values(tensor: &NormalizedTensor) -> Vec<f32> {
        tensor.tensor().flatten_all().unwrap().to_vec1::<f32>().unwrap()
    }

    #[test]
    fn white_page_becomes_zeros() {
        let page = GrayImage::from_pixel(28, 28, Luma([255]));
        let tensor = decode_image(&encode(DynamicImage::ImageLuma8(page), ImageFormat::Png)).unwrap();
        assert!(values(&tensor).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn black_page_becomes_ones() {
        let page = GrayImage::from_pixel(28, 28, Luma([0]));
        let tensor = decode_image(&encode(DynamicImage::ImageLuma8(page), ImageFormat::Bmp)).unwrap();
        assert!(values(&tensor).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn color_images_of_any_size_are_resized_to_the_input_shape() {
        let photo = RgbImage::from_fn(120, 90, |x, _| {
            if x < 60 {
                Rgb([250, 250, 250])
            } else {
                Rgb([10, 20, 30])
            }
        });
        let tensor = decode_image(&encode(DynamicImage::ImageRgb8(photo), ImageFormat::Jpeg)).unwrap();

        assert_eq!(tensor.tensor().dims4().unwrap(), INPUT_SHAPE);
        let values = values(&tensor);
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        // Left half was bright paper, right half dark ink.
        assert!(values[0] < 0.1);
        assert!(values[IMAGE_SIDE - 1] > 0.8);
    }

    #[test]
    fn empty_content_is_rejected() {
        assert_eq!(decode_image(&[]).unwrap_err(), PipelineError::EmptyInput);
    }

    #[test]
    fn unknown_bytes_are_unsupported() {
        assert_eq!(
            decode_image(b"definitely not an image").unwrap_err(),
            PipelineError::UnsupportedFormat
        );
    }

    #[test]
    fn recognised_but_disallowed_formats_are_unsupported() {
        assert_eq!(
            decode_image(b"GIF89a\x01\x00\x01\x00\x00\x00\x00;").unwrap_err(),
            PipelineError::UnsupportedFormat
        );
    }

    #[test]
    fn truncated_png_is_unsupported() {
        let mut bytes = encode(
            DynamicImage::ImageLuma8(GrayImage::new(28, 28)),
            ImageFormat::Png,
        );
        bytes.truncate(20);
        assert_eq!(decode_image(&bytes).unwrap_err(), PipelineError::UnsupportedFormat);
    }
}
