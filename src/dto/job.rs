use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobId {
    pub job_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobFile {
    pub job_file_id: i64,
    pub visible_name: Option<String>,
    pub internal_path: Option<String>,
    pub mime_type: Option<String>,
    pub rest_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStatus {
    pub job_file: Vec<JobFile>,
    pub status: Option<String>,
    pub progress: i32,
    pub visible_name: Option<String>,
}

impl JobStatus {
    pub fn last_file(&self) -> Option<&JobFile> {
        self.job_file.last()
    }

    pub fn is_done(&self) -> bool {
        self.progress >= 100
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub job_id: i64,
    pub progress: i32,
    pub status: Option<String>,
    pub job_birth: Option<String>,
    pub job_last_write: Option<String>,
    pub project: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobWithUrl {
    #[serde(flatten)]
    pub job: Job,
    #[serde(rename = "getJobUrl")]
    pub job_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsWithUrl {
    pub jobs: Vec<JobWithUrl>,
}

#[cfg(test)]
mod tests {
    use super::{JobStatus, JobsWithUrl};

    #[test]
    fn last_file_is_the_newest() {
        let status: JobStatus = serde_json::from_str(
            r#"{"progress":100,"status":"Done","jobFile":[
                {"jobFileId":1,"visibleName":"a.docx"},{"jobFileId":2,"visibleName":"a.pdf"}]}"#,
        )
        .unwrap();
        assert!(status.is_done());
        assert_eq!(status.last_file().map(|f| f.job_file_id), Some(2));
        assert!(JobStatus::default().last_file().is_none());
    }

    #[test]
    fn jobs_with_url_flatten_job() {
        let jobs: JobsWithUrl = serde_json::from_str(
            r#"{"jobs":[{"jobId":7,"progress":50,"getJobUrl":"/rest/1/all/job/7"}]}"#,
        )
        .unwrap();
        assert_eq!(jobs.jobs[0].job.job_id, 7);
        assert_eq!(jobs.jobs[0].job_url.as_deref(), Some("/rest/1/all/job/7"));
    }
}
