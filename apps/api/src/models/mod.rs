pub mod brand_voice;
pub mod caption;
pub mod signup;
pub mod social;
pub mod user;
