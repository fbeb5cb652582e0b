pub mod result_json;

pub use result_json::ResultJson;
