// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use crate::job_engine::job::{Job, JobStatus};

pub struct ClosureJob {
    desc: String,
    task: Box<dyn FnOnce() -> JobStatus + Send + 'static>,
}

impl ClosureJob {
    pub fn new(
        desc: impl Into<String>,
        f: Box<
            dyn FnOnce() -> JobStatus // runs exactly once on a work queue thread
                + Send // the closure itself is sent to that thread
                + 'static,
        >,
    ) -> Self {
        Self {
            desc: desc.into(),
            task: f,
        }
    }
}

impl Job for ClosureJob {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn execute(self: Box<Self>) -> JobStatus {
        (self.task)()
    }
}

/// Example usage
#[test]
pub fn example() {
    use crate::job_engine::job::WorkQueue;
    use futures::executor::block_on;

    let mut queue = WorkQueue::new(1).unwrap();

    let done = queue
        .dispatch(Box::new(ClosureJob::new(
            "Host maintenance",
            Box::new(|| {
                println!("Running job on {:?}", std::thread::current().name());
                JobStatus::Completed
            }),
        )))
        .unwrap();

    assert_eq!(block_on(done), Ok(JobStatus::Completed));

    queue.close();
    queue.wait_until_finished();
}
