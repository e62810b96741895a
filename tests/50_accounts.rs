mod common;

use anyhow::Result;
use jsonwebtoken::{decode, DecodingKey, Validation};
use reqwest::StatusCode;
use serde_json::{json, Value};

use cdmis_api::auth::SessionClaims;
use cdmis_api::types::UserRole;
use common::database::{self, seed_department, seed_record, seed_user, SEED_PASSWORD};

/// Read the claim without the server's secret.
fn claims_of(token: &str) -> Result<SessionClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

#[tokio::test]
async fn login_claim_carries_the_stored_role() -> Result<()> {
    let Some(pool) = database::pool().await? else { return Ok(()) };
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (department_id, department_name) = seed_department(&pool).await?;
    let custodian = seed_user(&pool, UserRole::Custodian, Some(department_id)).await?;

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "school_id": custodian.school_id, "password": SEED_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["user"]["role"], "Departmental Record Custodian");
    assert!(body.get("refreshToken").is_some());
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap_or_default();
    let claims = claims_of(token)?;
    assert_eq!(claims.payload.user_id, custodian.id);
    assert_eq!(claims.payload.role, UserRole::Custodian);
    assert_eq!(claims.payload.department_id, Some(department_id));

    let res = client.get(server.url("/auth/profile")).bearer_auth(token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let profile = res.json::<Value>().await?;
    assert_eq!(profile["department_name"], department_name);

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "school_id": custodian.school_id, "password": "not-the-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Invalid credentials" }));

    Ok(())
}

#[tokio::test]
async fn registration_conflicts_are_rejected() -> Result<()> {
    let Some(pool) = database::pool().await? else { return Ok(()) };
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (department_id, _) = seed_department(&pool).await?;
    let school_id = database::unique("REG");
    let email = format!("{}@example.edu", school_id.to_lowercase());
    let registration = |school_id: &str, email: &str, department_id: i64| {
        json!({
            "school_id": school_id,
            "password": "s3cret-enough",
            "full_name": "New Registrant",
            "email": email,
            "role": "Staff",
            "department_id": department_id,
        })
    };

    let res = client
        .post(server.url("/auth/register"))
        .json(&registration(&school_id, &email, department_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["user"]["school_id"], school_id);
    assert_eq!(body["user"]["role"], "Staff");

    let other_id = database::unique("REG");
    let other_email = format!("{}@example.edu", other_id.to_lowercase());
    for (sid, mail) in [(school_id.as_str(), other_email.as_str()), (other_id.as_str(), email.as_str())] {
        let res = client
            .post(server.url("/auth/register"))
            .json(&registration(sid, mail, department_id))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>().await?, json!({ "error": "User already exists" }));
    }

    let res = client
        .post(server.url("/auth/register"))
        .json(&registration(&other_id, &other_email, i64::MAX))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Department not found" }));

    Ok(())
}

#[tokio::test]
async fn dashboard_counts_the_callers_department() -> Result<()> {
    let Some(pool) = database::pool().await? else { return Ok(()) };
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (department_id, department_name) = seed_department(&pool).await?;
    let (elsewhere, _) = seed_department(&pool).await?;
    let custodian = seed_user(&pool, UserRole::Custodian, Some(department_id)).await?;

    let first = seed_record(&pool, department_id, &custodian, "Minutes", "Paper").await?;
    seed_record(&pool, department_id, &custodian, "Ledgers", "Paper").await?;
    seed_record(&pool, department_id, &custodian, "Scans", "Electronic").await?;
    seed_record(&pool, elsewhere, &custodian, "Not ours", "Paper").await?;

    sqlx::query(
        "INSERT INTO document_requests (record_id, requester_user_id, purpose, requester_id_image_path)
         VALUES ($1, $2, 'check', 'ids/card.png')",
    )
    .bind(first)
    .bind(custodian.id)
    .execute(&pool)
    .await?;

    let token = database::login(server, &client, &custodian).await?;
    let res = client.get(server.url("/reports/dashboard")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let stats = res.json::<Value>().await?;

    assert_eq!(stats["totalRecords"], 3);
    assert_eq!(
        stats["recordsByDepartment"],
        json!([{ "name": department_name, "count": 3 }])
    );
    assert_eq!(stats["recordsByMedium"][0], json!({ "record_medium": "Paper", "count": 2 }));
    assert_eq!(stats["recordsByMedium"][1], json!({ "record_medium": "Electronic", "count": 1 }));
    assert_eq!(stats["pendingRequests"], 1);
    assert!(stats["recentActivity"].is_array());

    Ok(())
}
