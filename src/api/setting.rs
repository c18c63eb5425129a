use crate::{
    client::decode,
    dto::{AllSetting, LabelsSetting, TraceabilitySetting},
    MatrixClient, MatrixError, Params, RequestSpec, Result,
};

impl MatrixClient {
    /// Project, category and plugin settings. Use project `all` for the
    /// customer settings.
    pub async fn get_all_settings(&self, project: &str) -> Result<AllSetting> {
        self.fetch(RequestSpec::get(format!("/{project}/setting")), "settings")
            .await
    }

    pub async fn get_setting(&self, project: &str, key: &str) -> Result<Option<String>> {
        let all = self.get_all_settings(project).await?;
        Ok(all.get(key).map(str::to_owned))
    }

    /// Decoded `labels` setting of a project.
    pub async fn get_labels_setting(&self, project: &str) -> Result<LabelsSetting> {
        let value = self.require_setting(project, "labels").await?;
        decode(&value, "labels setting")
    }

    /// Decoded `rules` (traceability) setting of a project.
    pub async fn get_traceability_setting(&self, project: &str) -> Result<TraceabilitySetting> {
        let value = self.require_setting(project, "rules").await?;
        decode(&value, "traceability setting")
    }

    async fn require_setting(&self, project: &str, key: &str) -> Result<String> {
        match self.get_setting(project, key).await? {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(MatrixError::MissingSetting {
                project: project.to_owned(),
                key: key.to_owned(),
            }),
        }
    }

    pub async fn set_project_setting(&self, project: &str, key: &str, value: &str) -> Result<String> {
        self.rest_post(
            &format!("/{project}/setting"),
            [("key", key), ("value", value)],
        )
        .await
    }

    /// Instance wide setting (project `all`).
    pub async fn set_customer_setting(&self, key: &str, value: &str) -> Result<String> {
        self.set_project_setting("all", key, value).await
    }

    /// Sets a plugin setting, for one project or, with `project` unset, for
    /// the plugin as a whole.
    pub async fn set_plugin_setting(
        &self,
        plugin_id: i64,
        project: Option<&str>,
        key: &str,
        value: &str,
        encrypted: bool,
    ) -> Result<String> {
        let query = Params::new()
            .with("plugin", plugin_id)
            .with("name", key)
            .with("value", value)
            .with("encrypted", if encrypted { "1" } else { "0" })
            .with_opt("project", project.filter(|p| !p.is_empty()));
        self.text(RequestSpec::put("/wlt/setting").query(query))
            .await
    }
}
