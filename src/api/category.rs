use crate::{
    client::decode,
    dto::{AllCategories, CategoryAdd, CategoryAndItems, FieldId},
    MatrixClient, MatrixError, Params, RequestSpec, Result,
};

impl MatrixClient {
    pub async fn get_all_categories(&self, project: &str) -> Result<AllCategories> {
        self.fetch(RequestSpec::get(format!("/{project}/cat")), "categories")
            .await
    }

    /// Categories as seen by the admin UI, hidden ones included.
    pub async fn get_all_categories_as_admin(&self, project: &str) -> Result<AllCategories> {
        let spec = RequestSpec::get(format!("/{project}/cat")).query([("adminUI", "1")]);
        self.fetch(spec, "categories").await
    }

    /// Category fields plus its root folder tree.
    pub async fn get_category(&self, project: &str, category: &str) -> Result<CategoryAndItems> {
        self.fetch(
            RequestSpec::get(format!("/{project}/cat/{category}")),
            "category",
        )
        .await
    }

    pub async fn add_category(
        &self,
        project: &str,
        short_label: &str,
        label: &str,
        reason: &str,
    ) -> Result<CategoryAdd> {
        let spec = RequestSpec::post(format!("/{project}")).query(
            Params::new()
                .with("label", label)
                .with("shortLabel", short_label)
                .with("reason", reason),
        );
        let body = self.text(spec).await?;
        let ack: CategoryAdd = decode(&body, "category creation")?;
        if ack.category_id == 0 {
            return Err(MatrixError::rejected("Error adding category", &body));
        }
        Ok(ack)
    }

    pub async fn delete_category(
        &self,
        project: &str,
        category: &str,
        reason: &str,
    ) -> Result<String> {
        let spec = RequestSpec::delete(format!("/{project}/cat/{category}"))
            .query([("reason", reason)]);
        self.text(spec).await
    }

    pub async fn rename_category(
        &self,
        project: &str,
        short_label: &str,
        new_short_label: &str,
        new_label: &str,
        reason: &str,
    ) -> Result<String> {
        let spec = RequestSpec::put(format!("/{project}/cat/{short_label}")).query(
            Params::new()
                .with("shortLabel", new_short_label)
                .with("label", new_label)
                .with("reason", reason),
        );
        self.text(spec).await
    }

    /// Adds a field of `field_type` (e.g. `richtext`, `test_steps`) to a
    /// category. `field_param` is the type-specific JSON configuration.
    pub async fn add_field(
        &self,
        project: &str,
        category: &str,
        label: &str,
        field_type: &str,
        field_param: Option<&str>,
        reason: &str,
    ) -> Result<FieldId> {
        let spec = RequestSpec::post(format!("/{project}/cat")).query(
            Params::new()
                .with("label", label)
                .with("category", category)
                .with("fieldType", field_type)
                .with("reason", reason)
                .with_opt("fieldParam", field_param.filter(|p| !p.is_empty())),
        );
        let body = self.text(spec).await?;
        let ack: FieldId = decode(&body, "field creation")?;
        if ack.field_id == 0 {
            return Err(MatrixError::rejected("Error adding field", &body));
        }
        Ok(ack)
    }

    pub async fn delete_field(
        &self,
        project: &str,
        category: &str,
        field_id: i64,
        reason: &str,
    ) -> Result<String> {
        let spec = RequestSpec::delete(format!("/{project}/field/{category}"))
            .query(Params::new().with("field", field_id).with("reason", reason));
        self.text(spec).await
    }

    pub async fn move_field(
        &self,
        project: &str,
        field_id: i64,
        new_position: u32,
        reason: &str,
    ) -> Result<String> {
        let spec = RequestSpec::put(format!("/{project}/field")).query(
            Params::new()
                .with("field", field_id)
                .with("order", new_position)
                .with("reason", reason),
        );
        self.text(spec).await
    }

    pub async fn rename_field(
        &self,
        project: &str,
        field_id: i64,
        new_label: &str,
        reason: &str,
    ) -> Result<String> {
        let spec = RequestSpec::put(format!("/{project}/field")).query(
            Params::new()
                .with("field", field_id)
                .with("label", new_label)
                .with("reason", reason),
        );
        self.text(spec).await
    }

    pub async fn set_category_setting(
        &self,
        project: &str,
        category: &str,
        key: &str,
        value: &str,
    ) -> Result<String> {
        self.rest_post(
            &format!("/{project}/cat/{category}/setting"),
            [("key", key), ("value", value)],
        )
        .await
    }
}
