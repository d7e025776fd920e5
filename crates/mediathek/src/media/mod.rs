pub mod media_format;
pub mod quality_tier;
pub mod stream_descriptor;
pub mod video_info;

pub use media_format::ContainerFormat;
pub use quality_tier::QualityTier;
pub use stream_descriptor::{StreamDescriptor, StreamDescriptorBuilder};
pub use video_info::VideoInfo;
