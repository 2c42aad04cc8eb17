/*
 * This module consolidates the platform-agnostic logic of the soft input
 * dialog: the session data types, the layout arithmetic in dialog units, the
 * binary dialog template encoder, and configuration loading.
 */
pub mod config;
pub mod dialog_template;
pub mod geometry;
pub mod models;

// Re-export key structures and enums
pub use models::{FieldFlags, NUMBER_PAD_INPUT_TYPE, OwnerWindow, SelectionRange};

pub use geometry::{
    DialogBaseUnits, DialogLayout, DluRect, InputArea, LayoutMetrics, OwnerMetrics, PixelRect,
    ScreenRect,
};

pub use dialog_template::{DialogTemplate, TemplateFont, TemplateSpec, encode_dialog_template};

// Re-export config related items
pub use config::{ConfigError, ConfigManagerOperations, CoreConfigManager, SoftInputConfig};
