pub mod seed;
pub mod services;
