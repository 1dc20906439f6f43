//! Layout templates: fixed regions, card archetypes and parse settings.

pub mod area;
pub mod settings;
pub mod template;

pub use area::{ImageArea, Rect, TextPolarity, IMAGE_HEIGHT, IMAGE_WIDTH};
pub use settings::{LabelParsingMethod, MaskColor, ParseOverrides, ParseSettings};
pub use template::CardLayout;
