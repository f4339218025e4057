pub mod aggregation;
pub mod classify;
pub mod params;
pub mod result;
pub mod schema;
pub mod template;

pub use classify::{classify, ResponseShape};
pub use params::{escape, Param, Params};
pub use result::{decode_result, Table};
pub use template::apply_parameters;
