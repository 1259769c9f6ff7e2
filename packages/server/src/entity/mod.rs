pub mod favorite;
pub mod locked_content;
pub mod profile;
pub mod project;
