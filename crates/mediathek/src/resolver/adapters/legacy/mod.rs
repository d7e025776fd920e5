mod builder;
mod manifest;

pub use builder::LegacyXmlAdapter;
