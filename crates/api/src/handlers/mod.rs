pub mod info;
pub mod screenshots;
