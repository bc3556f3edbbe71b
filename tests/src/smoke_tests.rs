use crate::stub_server::{self, ADMIN_PASSWORD, ADMIN_USERNAME};
use apicheck::{apicheck_test, Error, SchemaMode, SchemaStore, SessionConfiguration, TestSession};
use serde_json::{json, Value};

const VIDEOGAME_PAYLOAD: &str = include_str!("../request-payloads/videogame_post.json");

fn videogame_api(configuration: &mut SessionConfiguration) {
    if let Some(base_url) = stub_server::base_url() {
        configuration.set_base_url(base_url);
    }
    configuration.set_credentials(ADMIN_USERNAME, ADMIN_PASSWORD);
    configuration.set_schema_root(concat!(env!("CARGO_MANIFEST_DIR"), "/response-schemas"));
}

fn videogame_payload() -> Result<Value, Error> {
    Ok(serde_json::from_str(VIDEOGAME_PAYLOAD)?)
}

#[apicheck_test(videogame_api)]
async fn authentication_fails_with_invalid_credentials(
    session: &mut TestSession,
) -> Result<(), Error> {
    let response = session
        .api()
        .path("/api/authenticate")
        .body(json!({"username": "test", "password": "test"}))
        .suppress_auth()
        .post(403)
        .await?;

    session
        .expect(&response.get("token"))
        .not()
        .should_be_defined()?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn lists_at_most_ten_video_games(session: &mut TestSession) -> Result<(), Error> {
    let response = session
        .api()
        .path("/api/videogame")
        .suppress_auth()
        .get(200)
        .await?;

    session
        .expect(&response)
        .should_match_schema("videogame", "GET_videogames")
        .await?;
    session.expect(&response.is_array()).should_equal(true)?;
    session
        .expect(&response.as_array().map_or(0, Vec::len))
        .should_be_less_than_or_equal(10)?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn fetches_a_video_game_by_id(session: &mut TestSession) -> Result<(), Error> {
    let response = session
        .api()
        .path("/api/videogame/{id}")
        .path_params([("id", "1")])
        .suppress_auth()
        .get(200)
        .await?;

    session
        .expect(&response)
        .should_match_schema("videogame", "GET_videogame")
        .await?;
    session
        .expect(&response["name"])
        .should_equal("Resident Evil 4")?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn unknown_id_is_not_found(session: &mut TestSession) -> Result<(), Error> {
    session
        .api()
        .path("/api/v2/videogame/{id}")
        .path_params([("id", "99999")])
        .suppress_auth()
        .get(404)
        .await?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn creates_a_video_game(session: &mut TestSession) -> Result<(), Error> {
    let mut payload = videogame_payload()?;
    payload["name"] = json!("Super Mario 1");

    let response = session
        .api()
        .path("/api/videogame")
        .headers([
            ("Content-Type", "application/json"),
            ("Accept", "application/json"),
        ])
        .body(payload.clone())
        .post(200)
        .await?;

    session
        .expect(&response)
        .should_match_schema("videogame", "POST_videogame")
        .await?;
    session
        .expect(&response["name"])
        .should_equal(payload["name"].clone())?;
    session.expect(&response.get("id")).should_be_defined()?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn create_without_name_is_rejected(session: &mut TestSession) -> Result<(), Error> {
    let mut payload = videogame_payload()?;
    if let Some(fields) = payload.as_object_mut() {
        fields.remove("name");
    }

    session
        .api()
        .path("/api/videogame")
        .headers([
            ("Content-Type", "application/json"),
            ("Accept", "application/json"),
        ])
        .body(payload)
        .post(400)
        .await?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn updates_a_video_game(session: &mut TestSession) -> Result<(), Error> {
    let mut payload = videogame_payload()?;
    payload["name"] = json!("Assassin's Creed Odyssey");

    let response = session
        .api()
        .path("/api/videogame/{id}")
        .path_params([("id", "1")])
        .body(payload.clone())
        .put(200)
        .await?;

    session
        .expect(&response)
        .should_match_schema("videogame", "PUT_videogame")
        .await?;
    session
        .expect(&response["name"])
        .should_equal(payload["name"].clone())?;
    session.expect(&response["id"]).should_equal(1)?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn update_without_category_is_rejected(session: &mut TestSession) -> Result<(), Error> {
    let mut payload = videogame_payload()?;
    if let Some(fields) = payload.as_object_mut() {
        fields.remove("category");
    }

    session
        .api()
        .path("/api/videogame/{id}")
        .path_params([("id", "1")])
        .body(payload)
        .put(400)
        .await?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn deletes_a_video_game(session: &mut TestSession) -> Result<(), Error> {
    let response = session
        .api()
        .path("/api/videogame/{id}")
        .path_params([("id", "1")])
        .delete(200)
        .await?;

    session.expect(&response).should_equal("Video game deleted")?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn unauthorised_delete_is_forbidden(session: &mut TestSession) -> Result<(), Error> {
    session
        .api()
        .path("/api/videogame/{id}")
        .path_params([("id", "1")])
        .suppress_auth()
        .delete(403)
        .await?;

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn status_mismatch_reports_both_codes_and_the_request(
    session: &mut TestSession,
) -> Result<(), Error> {
    let error = session
        .api()
        .path("/api/videogame/{id}")
        .path_params([("id", "1")])
        .suppress_auth()
        .delete(200)
        .await
        .unwrap_err();

    let message = error.to_string();
    assert!(matches!(
        error,
        Error::StatusMismatch {
            expected: 200,
            actual: 403,
            ..
        }
    ));
    assert!(message.contains("Expected status code 200 but got 403"));
    assert!(message.contains("---------REQUEST DETAILS---------"));
    assert!(message.contains("/api/videogame/1"));

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn builder_resets_between_calls(session: &mut TestSession) -> Result<(), Error> {
    session
        .api()
        .path("/api/videogame/{id}")
        .path_params([("id", "2")])
        .query_params([("expand", "true")])
        .suppress_auth()
        .get(200)
        .await?;

    let state = session.api().call_state();
    assert!(state.path.is_empty());
    assert!(state.path_params.is_empty());
    assert!(state.query_params.is_empty());

    let error = session.api().get(200).await.unwrap_err();
    assert!(matches!(error, Error::StatusMismatch { actual: 404, .. }));

    Ok(())
}

#[apicheck_test(videogame_api)]
async fn captured_schema_accepts_the_observed_payload(
    session: &mut TestSession,
) -> Result<(), Error> {
    let directory = tempfile::tempdir()?;
    let store = SchemaStore::new(directory.path());

    let response = session
        .api()
        .path("/api/videogame/{id}")
        .path_params([("id", "3")])
        .suppress_auth()
        .get(200)
        .await?;

    session
        .expect(&response)
        .with_schema_store(store.clone())
        .should_match_schema_with("videogame", "GET_videogame", SchemaMode::Capture)
        .await?;

    assert!(store.resolve("videogame", "GET_videogame").exists());
    session
        .expect(&json!({"id": "three"}))
        .with_schema_store(store)
        .not()
        .should_match_schema("videogame", "GET_videogame")
        .await
}
