mod ai;
mod billing;
mod common;
mod deploy;
mod locked_content;
mod market;
mod profile;
mod verify;
