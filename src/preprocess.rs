use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

use crate::error::PredictError;

/// Side length of the square frame the model was trained on.
pub const INPUT_SIZE: u32 = 224;
pub const CHANNELS: usize = 3;

/// Decodes raw upload bytes and turns them into the model's input tensor.
pub fn load_and_preprocess(bytes: &[u8]) -> Result<Array4<f32>, PredictError> {
    let img = image::load_from_memory(bytes)?;
    Ok(to_tensor(&img))
}

/// Stretches the image to `INPUT_SIZE` x `INPUT_SIZE` and scales it to `[0, 1]`.
///
/// Layout is NHWC with a batch of one: `(1, 224, 224, 3)`.
pub fn to_tensor(img: &DynamicImage) -> Array4<f32> {
    let resized = img
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom)
        .to_rgb8();

    let side = INPUT_SIZE as usize;
    Array4::from_shape_fn((1, side, side, CHANNELS), |(_, y, x, c)| {
        resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
}
