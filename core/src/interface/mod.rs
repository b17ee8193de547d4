pub mod request;
pub mod response;

pub use request::{PipelineOverrides, ProcessRequest, StatisticsRequest};
pub use response::{ProcessResponse, SeriesFailure, StatisticsResponse};
