mod create_request;
pub use create_request::CreateJobRequest;

mod call_request;
pub use call_request::CallRequest;

mod job_view;
pub use job_view::{JobFunctionView, JobView};
