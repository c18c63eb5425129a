use matrixreq_client::{MatrixClient, MatrixError};

fn live_client() -> Option<MatrixClient> {
    match MatrixClient::from_env() {
        Ok(client) => Some(client),
        Err(MatrixError::Config(reason)) => {
            eprintln!("skipping live test: {reason}");
            None
        }
        Err(err) => panic!("client must build from env: {err}"),
    }
}

#[tokio::test]
async fn live_read_only_tour() {
    let Some(client) = live_client() else {
        return;
    };

    let version = client
        .get_server_version()
        .await
        .expect("server version must be readable");
    assert!(!version.is_empty());

    let projects = client
        .get_all_projects()
        .await
        .expect("project list must decode");

    let zones = client
        .get_time_zones()
        .await
        .expect("time zones must decode");
    assert!(!zones.is_empty());

    let Some(project) = projects.first() else {
        eprintln!("instance has no visible project, stopping here");
        return;
    };

    let categories = client
        .get_all_categories(project)
        .await
        .expect("categories must decode");
    let Some(category) = categories.category_list.category_extended.first() else {
        return;
    };

    let short = &category.category.short_label;
    let detail = client
        .get_category(project, short)
        .await
        .expect("category must decode");
    for field in &detail.field_list {
        assert!(field.id > 0, "field {} has no id", field.label);
    }

    client
        .get_fancy_tree(project, None)
        .await
        .expect("tree must decode");
}

#[tokio::test]
async fn live_unknown_item_is_not_a_transport_error() {
    let Some(client) = live_client() else {
        return;
    };

    let outcome = client
        .execute(&matrixreq_client::RequestSpec::get(
            "/__no_such_project__/item/REQ-999999",
        ))
        .await
        .expect("HTTP errors are returned as outcomes");
    assert!(!outcome.is_success());
}
