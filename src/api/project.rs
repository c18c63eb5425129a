use std::path::Path;

use crate::{
    client::decode,
    dto::{
        DateAck, DeletedProjectsSetting, JobId, LicenseStatus, ProjectDetails,
        ProjectsAndSettings, ServerStatus, TrimAuditList, LEGACY_SERVER_VERSION,
    },
    MatrixClient, Params, RequestSpec, Result,
};

impl MatrixClient {
    /// Short labels of every project visible to the caller.
    pub async fn get_all_projects(&self) -> Result<Vec<String>> {
        let list: ProjectsAndSettings = self
            .fetch(RequestSpec::get("/").query([("silent", "1")]), "project list")
            .await?;
        Ok(list.short_labels())
    }

    /// Projects with customer settings. Servers too old to report their
    /// version get `1.6.999.999`.
    pub async fn get_all_projects_and_settings(&self) -> Result<ProjectsAndSettings> {
        let spec = RequestSpec::get("/").query([("silent", "1"), ("adminUI", "1")]);
        let list: ProjectsAndSettings = self.fetch(spec, "project list").await?;
        Ok(list.with_default_version())
    }

    pub async fn get_project_and_server_version(&self) -> Result<ProjectsAndSettings> {
        let spec = RequestSpec::get("/").query([
            ("silent", "1"),
            ("adminUI", "1"),
            ("output", "project,serverVersion"),
        ]);
        let list: ProjectsAndSettings = self.fetch(spec, "project list").await?;
        Ok(list.with_default_version())
    }

    /// Available since server 1.8.437.
    pub async fn get_server_status(&self) -> Result<ServerStatus> {
        let spec = RequestSpec::get("/all/status").query([("silent", "1")]);
        self.fetch(spec, "server status").await
    }

    /// Server version, fetched once per client and cached.
    pub async fn get_server_version(&self) -> Result<String> {
        if let Some(version) = self.cached_server_version() {
            return Ok(version.to_owned());
        }
        let version = self
            .get_all_projects_and_settings()
            .await?
            .server_version
            .unwrap_or_else(|| LEGACY_SERVER_VERSION.to_owned());
        Ok(self.cache_server_version(version).to_owned())
    }

    /// Users and groups with access to a project.
    pub async fn get_project_details(&self, project: &str) -> Result<ProjectDetails> {
        self.fetch(RequestSpec::get(format!("/{project}")), "project details")
            .await
    }

    pub async fn delete_project(&self, project: &str) -> Result<String> {
        let spec = RequestSpec::delete(format!("/{project}")).query([("confirm", "yes")]);
        self.text(spec).await
    }

    /// Starts a clone job and returns its id.
    pub async fn clone_project(
        &self,
        project: &str,
        new_short_label: &str,
        new_label: &str,
        keep_content: bool,
    ) -> Result<i64> {
        let spec = RequestSpec::post(format!("/{project}/clone")).query(
            Params::new()
                .with("label", new_label)
                .with("shortLabel", new_short_label)
                .with("keepContent", if keep_content { "1" } else { "0" }),
        );
        let job: JobId = self.fetch(spec, "clone job").await?;
        Ok(job.job_id)
    }

    /// Uploads a project export. Returns the import job id.
    pub async fn upload_project(
        &self,
        file: impl AsRef<Path>,
        label: Option<&str>,
        short_label: Option<&str>,
        overwrite: bool,
    ) -> Result<i64> {
        let query = Params::new()
            .with_opt("label", label.filter(|l| !l.is_empty()))
            .with_opt("shortLabel", short_label.filter(|l| !l.is_empty()))
            .with_opt("overwrite", overwrite.then_some("yes"));
        let spec = RequestSpec::post("/").query(query).file(file.as_ref());
        let job: JobId = self.fetch(spec, "project upload job").await?;
        Ok(job.job_id)
    }

    /// One page of a project's audit trail. With `technical` the entries
    /// carry the low level change records.
    pub async fn get_project_audit(
        &self,
        project: &str,
        start_at: Option<u32>,
        max_results: Option<u32>,
        technical: bool,
    ) -> Result<TrimAuditList> {
        let form = Params::new()
            .with_opt("startAt", start_at)
            .with_opt("maxResults", max_results)
            .with_opt("tech", technical.then_some("yes"));
        self.audit(&format!("/{project}/audit"), form).await
    }

    /// Audit pages are read with a form body on `GET` and only a 200 counts.
    pub(crate) async fn audit(&self, path: &str, form: Params) -> Result<TrimAuditList> {
        let outcome = self.rest_get_with_body(path, form, None).await?.require_ok()?;
        outcome.json("audit")
    }

    /// Short labels of deleted projects, from the `deleted_projects`
    /// customer setting.
    pub async fn get_deleted_projects(&self) -> Result<Vec<String>> {
        match self.get_setting("all", "deleted_projects").await? {
            Some(value) if !value.is_empty() => {
                let setting: DeletedProjectsSetting = decode(&value, "deleted projects")?;
                Ok(setting.deleted)
            }
            _ => Ok(Vec::new()),
        }
    }

    pub async fn get_license_status(&self) -> Result<LicenseStatus> {
        self.fetch(RequestSpec::get("/all/license"), "license status")
            .await
    }

    pub async fn get_time_zones(&self) -> Result<Vec<String>> {
        self.fetch(RequestSpec::get("/all/timezone"), "time zones")
            .await
    }

    /// Server date formats, and `date` rendered in them when given.
    pub async fn get_date(&self, date: Option<&str>) -> Result<DateAck> {
        let query = Params::new()
            .with_opt("date", date.filter(|d| !d.is_empty()))
            .with_opt("silent", self.is_silent().then_some("1"));
        self.fetch(RequestSpec::get("/all/date").query(query), "date")
            .await
    }

    /// Writes `message` to the server log.
    pub async fn send_log(&self, message: &str) -> Result<()> {
        self.rest_post("/all/log", [("message", message)]).await?;
        Ok(())
    }
}
