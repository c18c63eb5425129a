use std::path::Path;

use super::project_or_all;
use crate::{
    dto::{JobId, JobStatus, JobsWithUrl},
    MatrixClient, MatrixError, Params, RequestSpec, Result,
};

impl MatrixClient {
    /// Progress and produced files of a job. Jobs outside a project live
    /// under `all`.
    pub async fn get_job_status(&self, project: Option<&str>, job_id: i64) -> Result<JobStatus> {
        let path = format!("/{}/job/{job_id}", project_or_all(project));
        self.fetch(RequestSpec::get(path), "job status").await
    }

    pub async fn get_all_jobs(&self, project: Option<&str>) -> Result<JobsWithUrl> {
        let path = format!("/{}/job/", project_or_all(project));
        self.fetch(RequestSpec::get(path), "job list").await
    }

    pub async fn delete_job(&self, job_id: i64, reason: &str) -> Result<String> {
        let spec = RequestSpec::delete(format!("/all/job/{job_id}")).query([("reason", reason)]);
        self.text(spec).await
    }

    /// Starts generating report `report` (e.g. `REPORT-1`, `DOC-3`).
    /// `options` are passed through as query parameters, e.g. `format=pdf`.
    pub async fn launch_report(
        &self,
        project: &str,
        report: &str,
        options: impl Into<Params>,
    ) -> Result<JobId> {
        let spec = RequestSpec::post(format!("/{project}/report/{report}")).query(options);
        self.fetch(spec, "report job").await
    }

    /// Starts generating the document of a signed `SIGN-` item.
    pub async fn launch_signed_report(
        &self,
        project: &str,
        sign_item: &str,
        format: Option<&str>,
    ) -> Result<JobId> {
        let base = self.base_url();
        let form = Params::new()
            .with_opt("format", format.filter(|f| !f.is_empty()))
            .with("url", base.replace(crate::REST_PATH, ""))
            .with("resturl", base);
        let spec = RequestSpec::post(format!("/{project}/signedreport/{sign_item}")).form(form);
        self.fetch(spec, "signed report job").await
    }

    /// Content of a job file, as text.
    pub async fn get_report_file(
        &self,
        project: &str,
        job_id: i64,
        file_id: i64,
        options: impl Into<Params>,
    ) -> Result<String> {
        let spec = RequestSpec::get(format!("/{project}/job/{job_id}/{file_id}")).query(options);
        self.text(spec).await
    }

    /// Streams a job file to `dest`. Returns the HTTP status.
    pub async fn download_job_file(
        &self,
        project: &str,
        job_id: i64,
        file_id: i64,
        dest: impl AsRef<Path>,
    ) -> Result<u16> {
        self.rest_get_to_file(&format!("/{project}/job/{job_id}/{file_id}"), dest)
            .await
    }

    /// Streams the newest file of a finished job to `dest`.
    pub async fn download_last_job_file(
        &self,
        project: &str,
        job_id: i64,
        status: &JobStatus,
        dest: impl AsRef<Path>,
    ) -> Result<u16> {
        let file = status
            .last_file()
            .ok_or_else(|| MatrixError::InvalidArgument("Job has no files".to_owned()))?;
        self.download_job_file(project, job_id, file.job_file_id, dest)
            .await
    }

    /// Streams the project's XSD schema to `dest`.
    pub async fn download_schema_file(
        &self,
        project: &str,
        simple: bool,
        exclude_categories: Option<&str>,
        dest: impl AsRef<Path>,
    ) -> Result<u16> {
        let query = Params::new()
            .with("simple", if simple { "1" } else { "0" })
            .with_opt(
                "excludeCategories",
                exclude_categories.filter(|c| !c.is_empty()),
            );
        let spec = RequestSpec::get(format!("/{project}/schema")).query(query);
        self.execute_to_file(&spec, dest.as_ref()).await
    }

    /// Starts an XML export of a comma separated list of items.
    pub async fn export_items(&self, project: &str, items: &str) -> Result<JobId> {
        let spec = RequestSpec::get(format!("/{project}/export")).query([("itemList", items)]);
        self.fetch(spec, "export job").await
    }

    /// Reports progress of a job run by a client-side worker, optionally
    /// attaching a result file.
    pub async fn set_job_progress(
        &self,
        project: &str,
        job_id: i64,
        progress: u32,
        status: Option<&str>,
        file: Option<&Path>,
    ) -> Result<String> {
        let query = Params::new()
            .with("progress", progress)
            .with_opt("status", status.filter(|s| !s.is_empty()));
        let spec = RequestSpec::post(format!("/{project}/job/{job_id}")).query(query);
        let spec = match file {
            Some(file) => spec.file(file),
            None => spec,
        };
        self.text(spec).await
    }
}
