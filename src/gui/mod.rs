pub mod image_view;
pub mod theme;
pub mod toolbar;
pub mod windowing_dialog;
