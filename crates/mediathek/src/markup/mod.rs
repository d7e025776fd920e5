pub mod html;
pub mod json;
pub mod xml;

pub use html::HtmlDocument;
pub use xml::{XmlDocument, XmlElement};
