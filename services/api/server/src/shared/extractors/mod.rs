pub mod input;
pub mod request_id;
