mod run;

pub use run::{PublishRunContext, PublishRunJob, process_publish_run_job, publish_run_schedule};
