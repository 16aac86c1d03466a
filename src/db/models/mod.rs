pub mod account;
pub mod garage;
pub mod profile;
pub mod review;
pub mod service_request;
pub mod vehicle;
