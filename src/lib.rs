pub mod face_api;
pub mod main_module;
pub mod shared;
