/// Профили и глубина перемешанного слоя

pub mod mixed_layer;
pub mod profiles;

pub use mixed_layer::{mixed_layer_depth, MldExtractor};
pub use profiles::{Profile, ProfileGrouper};
