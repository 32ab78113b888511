pub mod constants;
pub mod jconfig;
