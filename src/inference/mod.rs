pub mod classifier;
pub mod image_decoder;
pub mod models;
pub mod pixel_array;
pub mod task;
pub mod tensor;
