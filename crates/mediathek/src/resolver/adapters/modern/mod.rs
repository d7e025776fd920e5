mod builder;
mod models;

pub use builder::ModernJsonAdapter;
pub use models::PlayerParams;
