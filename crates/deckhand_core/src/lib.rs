pub mod core_api;
pub mod mappings;
pub mod refs;
pub mod titles;
pub mod verb;
