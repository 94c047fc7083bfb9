pub mod sampling;
pub mod services;
pub mod utils;
