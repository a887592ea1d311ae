pub mod logging;
pub mod request_id;

pub use logging::{init_test_tracing, init_tracing};
pub use request_id::{REQUEST_ID_HEADER, inject_request_id, new_request_id};
