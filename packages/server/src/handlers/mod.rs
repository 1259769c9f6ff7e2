pub mod ai;
pub mod airdrop;
pub mod billing;
pub mod deploy;
pub mod locked_content;
pub mod market;
pub mod profile;
pub mod project;
pub mod verify;
