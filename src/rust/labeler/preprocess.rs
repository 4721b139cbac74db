//! Image decoding and conversion into the network's input tensor.

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

use super::LabelerError;
use crate::ModelCharacteristics;

/// Decodes an encoded image (PNG or JPEG) from memory.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, LabelerError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Resizes the image to the model's square input and converts it to a
/// `[1, 3, H, W]` tensor, scaled to [0, 1] then normalized per channel with the
/// model's mean and standard deviation.
pub fn image_to_tensor(image: &DynamicImage, characteristics: &ModelCharacteristics) -> Array4<f32> {
    let size = characteristics.input_size;
    let resized = image.resize_exact(size, size, FilterType::Triangle);
    let rgb = resized.to_rgb8();
    let mean = characteristics.mean;
    let std = characteristics.std;

    Array4::from_shape_fn((1, 3, size as usize, size as usize), |(_, c, y, x)| {
        let pixel = rgb.get_pixel(x as u32, y as u32);
        (pixel[c] as f32 / 255.0 - mean[c]) / std[c]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use crate::BuiltinModel;

    fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        let mut img = ImageBuffer::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgb(color);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_tensor_shape() {
        let characteristics = BuiltinModel::MobileNetV2.characteristics();
        let tensor = image_to_tensor(&solid_image(320, 200, [0, 0, 0]), &characteristics);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_channel_normalization() {
        let characteristics = BuiltinModel::MobileNetV2.characteristics();
        let tensor = image_to_tensor(&solid_image(50, 50, [255, 0, 0]), &characteristics);

        let red = (1.0 - characteristics.mean[0]) / characteristics.std[0];
        let green = (0.0 - characteristics.mean[1]) / characteristics.std[1];
        assert!((tensor[[0, 0, 10, 10]] - red).abs() < 1e-5);
        assert!((tensor[[0, 1, 10, 10]] - green).abs() < 1e-5);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_image(b"not an image"), Err(LabelerError::Image(_))));
    }
}
