pub mod geo;
pub mod lifecycle;
pub mod validation;
