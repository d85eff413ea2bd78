mod common;

use anyhow::Result;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mosque_registry::filter::ListQuery;
use mosque_registry::models::{CreateWorker, Mosque, UpdateDistrict, WithPhoto};
use mosque_registry::transport::Upload;
use mosque_registry::types::Id;
use mosque_registry::Mutation;

#[tokio::test]
async fn created_mosque_appears_in_refetched_branch_list() -> Result<()> {
    let server = MockServer::start().await;
    let mosques = common::api_path("/dashboard/mosques");

    Mock::given(method("GET"))
        .and(path(mosques.as_str()))
        .and(query_param("filter[branch.name]", "North"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::list_body(
            vec![json!({"id": 1, "name": "Mosque of Light", "branch": {"id": 2, "name": "North"}})],
            1,
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(mosques.as_str()))
        .and(query_param("filter[branch.name]", "North"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::list_body(
            vec![
                json!({"id": 1, "name": "Mosque of Light", "branch": {"id": 2, "name": "North"}}),
                json!({"id": 5, "name": "Dawn Mosque", "branch": {"id": 2, "name": "North"}}),
            ],
            2,
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(mosques.as_str()))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("cirty_or_village=Uptown"))
        .and(body_string_contains("support_friday=1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::item_body(json!({
            "id": 5, "name": "Dawn Mosque", "branch_id": 2, "district_id": 7
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let registry = common::registry(&server)?;
    let query = ListQuery::new().filter("branch_name", "North").filter("district_name", "");

    let before = registry.mosques().list(&query).await?;
    assert_eq!(before.total, 1);

    // Served from cache while fresh
    registry.mosques().list(&query).await?;
    assert_eq!(common::received_queries(&server, "/dashboard/mosques").await.len(), 1);

    let created = registry
        .mutate(
            "mosques",
            Mutation::Create(json!({
                "branch_id": 2,
                "district_id": 7,
                "name": "Dawn Mosque",
                "city_or_village": "Uptown",
                "support_friday": true
            })),
        )
        .await?;
    assert_eq!(created["id"], json!(5));

    let after = registry.mosques().list(&query).await?;
    let names: Vec<&str> = after.items.iter().map(|m: &Mosque| m.name.as_str()).collect();
    assert_eq!(names, vec!["Mosque of Light", "Dawn Mosque"]);
    assert_eq!(common::received_queries(&server, "/dashboard/mosques").await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn update_rejection_shows_field_detail() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(common::api_path("/dashboard/districts/4")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "message": "The given data was invalid.",
            "details": {"name": ["Name already taken"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = common::registry(&server)?;
    let err = registry
        .districts()
        .update(4, &UpdateDistrict { name: Some("Uptown".into()), ..Default::default() })
        .await
        .unwrap_err();

    assert_eq!(err.display_message("Update failed"), "Name already taken");
    Ok(())
}

#[tokio::test]
async fn invalid_payload_never_reaches_the_backend() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::api_path("/dashboard/workers")))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let registry = common::registry(&server)?;
    let payload = CreateWorker {
        branch_id: Some(Id::from(2)),
        mosque_id: Some(Id::from(5)),
        name: "Ahmad".into(),
        job_title: "imam".into(),
        quran_levels: "hafiz".into(),
        salary: Some(Decimal::from(-10)),
        ..Default::default()
    };
    let err = registry.workers().create(&payload).await.unwrap_err();

    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert!(err.field_detail().is_some());
    Ok(())
}

#[tokio::test]
async fn worker_photo_is_sent_as_multipart() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::api_path("/dashboard/workers/12")))
        .and(body_string_contains("name=\"image\"; filename=\"face.png\""))
        .and(body_string_contains("name=\"quran_levels\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::item_body(json!({
            "id": 12, "name": "Ahmad", "quran_levels": "hafiz", "image": "/storage/face.png"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let registry = common::registry(&server)?;
    let mut payload = mosque_registry::models::UpdateWorker {
        quran_levels: Some("hafiz".into()),
        ..Default::default()
    };
    payload.set_photo(Upload {
        file_name: "face.png".into(),
        mime: Some("image/png".into()),
        bytes: b"PNGDATA".to_vec(),
    });

    let worker = registry.workers().update(12, &payload).await?;
    assert_eq!(worker.name, "Ahmad");
    Ok(())
}

#[tokio::test]
async fn concurrent_identical_reads_share_one_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(common::api_path("/dashboard/districts")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::list_body(vec![json!({"id": 1, "name": "Uptown", "branch_id": 2})], 1))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let registry = common::registry(&server)?;
    let query = ListQuery::new().filter("branch_name", "North");
    let districts = registry.districts();
    let (a, b) = tokio::join!(districts.list(&query), districts.list(&query));

    assert_eq!(a?.items[0].name, "Uptown");
    assert_eq!(b?.total, 1);
    Ok(())
}

#[tokio::test]
async fn delete_invalidates_cached_detail() -> Result<()> {
    let server = MockServer::start().await;
    let item = common::api_path("/dashboard/branches/3");
    Mock::given(method("GET"))
        .and(path(item.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::item_body(json!({"id": 3, "name": "South"}))))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(item.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": null})))
        .expect(1)
        .mount(&server)
        .await;

    let registry = common::registry(&server)?;
    assert_eq!(registry.branches().get(3).await?.name, "South");
    assert_eq!(registry.branches().get(3).await?.name, "South");

    registry.mutate("branches", Mutation::Delete(Id::from(3))).await?;
    registry.fetch_one("branches", 3).await?;
    Ok(())
}
