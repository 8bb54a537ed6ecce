pub mod operator;
pub mod slotted_page;
pub mod tuple;
