pub mod convnet;
pub mod digit_model;
pub mod mlp;
pub mod model;
