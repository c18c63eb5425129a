use crate::{
    client::decode,
    dto::{
        CreateUser, GroupList, TokenAck, TrimAuditList, User, UserAck, UserDetails,
        UserDetailsAdvanced, UserEdit, UserList, UserListWithDetails,
    },
    util::url_encode,
    MatrixClient, MatrixError, Params, RequestSpec, Result,
};

fn user_ack(body: &str) -> Result<i64> {
    let ack: UserAck = decode(body, "user creation")?;
    if ack.user_id <= 0 {
        return Err(MatrixError::rejected("Unable to add user", body));
    }
    Ok(ack.user_id)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|err| MatrixError::InvalidArgument(err.to_string()))
}

impl MatrixClient {
    pub async fn get_all_users(&self) -> Result<UserList> {
        self.fetch(RequestSpec::get("/user"), "user list").await
    }

    pub async fn get_all_users_with_details(&self) -> Result<UserListWithDetails> {
        let spec = RequestSpec::get("/user").query([("details", "1")]);
        self.fetch(spec, "user list").await
    }

    pub async fn get_user_details(&self, user: &str) -> Result<UserDetails> {
        self.fetch(
            RequestSpec::get(format!("/user/{}/details", url_encode(user))),
            "user details",
        )
        .await
    }

    /// Account state, tokens and admin flags of a user.
    pub async fn get_user_details_advanced(&self, user: &str) -> Result<UserDetailsAdvanced> {
        self.fetch(
            RequestSpec::get(format!("/user/{}", url_encode(user))),
            "user details",
        )
        .await
    }

    /// Creates a user and returns its id.
    pub async fn add_user(&self, login: &str, password: &str, email: &str) -> Result<i64> {
        let spec = RequestSpec::post("/user").query(
            Params::new()
                .with("login", login)
                .with("password", password)
                .with("email", email),
        );
        let body = self.text(spec).await?;
        user_ack(&body)
    }

    /// Creates a user from its JSON description and returns its id.
    pub async fn add_user_json(&self, user: &CreateUser) -> Result<i64> {
        let spec = RequestSpec::post("/user").query([("json", to_json(user)?)]);
        let body = self.text(spec).await?;
        user_ack(&body)
    }

    /// Grants `permission` (0 none, 1 read, 2 read-write, 3 admin) on a
    /// project.
    pub async fn add_user_to_project(
        &self,
        user: &str,
        project: &str,
        permission: i32,
    ) -> Result<String> {
        let spec = RequestSpec::post(format!("/user/{}/{}", url_encode(user), url_encode(project)))
            .query([("permission", permission.to_string())]);
        self.text(spec).await
    }

    pub async fn update_user_password(&self, user: &str, password: &str) -> Result<String> {
        let spec = RequestSpec::put(format!("/user/{}", url_encode(user)))
            .query([("password", password)]);
        self.text(spec).await
    }

    pub async fn update_user_details(&self, user: &UserEdit) -> Result<String> {
        let spec = RequestSpec::put(format!("/user/{}", url_encode(&user.login)))
            .query([("json", to_json(user)?)]);
        self.text(spec).await
    }

    /// Available since server 2.2.
    pub async fn rename_user(&self, user: &str, new_login: &str) -> Result<String> {
        self.rest_put(
            &format!("/user/{}/rename", url_encode(user)),
            [("newLogin", new_login)],
        )
        .await
    }

    pub async fn delete_user(&self, user: &str) -> Result<String> {
        let spec = RequestSpec::delete(format!("/user/{}", url_encode(user)))
            .query([("confirm", "yes")]);
        self.text(spec).await
    }

    pub async fn set_user_setting(&self, user: &str, key: &str, value: &str) -> Result<String> {
        self.rest_post(
            &format!("/user/{}/setting", url_encode(user)),
            [("key", key), ("value", value)],
        )
        .await
    }

    /// Creates a token for `purpose` (`oauth` or `password_reset`). The
    /// server generates the value unless one is given; validity is unlimited
    /// unless `validity_hours` is set.
    pub async fn add_token(
        &self,
        user: &str,
        purpose: &str,
        reason: Option<&str>,
        validity_hours: Option<u32>,
        value: Option<&str>,
    ) -> Result<TokenAck> {
        let form = Params::new()
            .with("purpose", purpose)
            .with_opt("reason", reason.filter(|r| !r.is_empty()))
            .with_opt("value", value.filter(|v| !v.is_empty()))
            .with_opt("validity", validity_hours);
        let body = self
            .rest_post(&format!("/user/{}/token", url_encode(user)), form)
            .await?;
        decode(&body, "token")
    }

    pub async fn delete_token(&self, user: &str, token: &str) -> Result<String> {
        let spec = RequestSpec::delete(format!("/user/{}/token", url_encode(user)))
            .query([("value", token)]);
        self.text(spec).await
    }

    /// Sets a new password using a `password_reset` token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<User> {
        let body = self
            .rest_post(
                "/user/xxx/reset_password",
                [("token", token), ("new_password", new_password)],
            )
            .await?;
        decode(&body, "user")
    }

    pub async fn get_user_audit(
        &self,
        user: &str,
        start_at: Option<u32>,
        max_results: Option<u32>,
    ) -> Result<TrimAuditList> {
        let form = Params::new()
            .with_opt("startAt", start_at)
            .with_opt("maxResults", max_results);
        self.audit(&format!("/user/{}/audit", url_encode(user)), form)
            .await
    }

    pub async fn get_all_groups(&self) -> Result<GroupList> {
        self.fetch(RequestSpec::get("/group"), "group list").await
    }

    /// Groups with their members and project permissions.
    pub async fn get_all_groups_with_details(&self) -> Result<GroupList> {
        let spec = RequestSpec::get("/group").query([("details", "1")]);
        self.fetch(spec, "group list").await
    }

    /// Creates a group. Returns its id, 0 when the server answers anything
    /// but a number.
    pub async fn add_group(&self, group: &str, reason: &str) -> Result<i64> {
        let body = self
            .rest_post(&format!("/group/{}", url_encode(group)), [("reason", reason)])
            .await?;
        Ok(body.trim().parse().unwrap_or(0))
    }

    pub async fn delete_group(&self, group: &str, reason: &str) -> Result<()> {
        self.rest_delete_with_body(
            &format!("/group/{}", url_encode(group)),
            [("reason", reason), ("confirm", "yes")],
            None,
        )
        .await?;
        Ok(())
    }

    pub async fn rename_group(&self, group: &str, new_name: &str) -> Result<String> {
        self.rest_put(
            &format!("/group/{}/rename", url_encode(group)),
            [("newName", new_name)],
        )
        .await
    }

    pub async fn add_group_to_project(
        &self,
        group: &str,
        project: &str,
        permission: i32,
    ) -> Result<String> {
        self.rest_post(
            &format!("/group/{}/project/{}", url_encode(group), url_encode(project)),
            [("permission", permission.to_string())],
        )
        .await
    }

    pub async fn add_user_to_group(&self, group: &str, user: &str, reason: &str) -> Result<()> {
        self.rest_put(
            &format!("/group/{}/user/{}", url_encode(group), url_encode(user)),
            [("reason", reason)],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::user_ack;
    use crate::MatrixError;

    #[test]
    fn non_positive_user_id_is_rejected() {
        assert_eq!(user_ack(r#"{"userId":42}"#).unwrap(), 42);
        assert!(matches!(
            user_ack(r#"{"userId":0}"#),
            Err(MatrixError::Rejected { .. })
        ));
        assert!(matches!(
            user_ack(r#"{"userId":-1}"#),
            Err(MatrixError::Rejected { .. })
        ));
        assert!(matches!(user_ack("oops"), Err(MatrixError::Decode { .. })));
    }
}
