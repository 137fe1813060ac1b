pub mod collision;
pub mod gravity;
