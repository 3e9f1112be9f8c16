//! HTTP handlers for the Swift v1 surface. Streams object bodies where
//! possible and delegates storage concerns to `GatewayStore`.

use crate::errors::AppError;
use crate::gateway::GatewayState;
use crate::gateway::store::ReadPlan;
use crate::models::{ObjectInfo, ObjectRecord};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Deserialize;
use std::io;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// Query params accepted by listings.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub path: Option<String>,
    pub prefix: Option<String>,
    pub format: Option<String>,
}

/// GET `/auth/v1.0` — tempauth handshake.
///
/// Issues a token and advertises the storage URL. Bad credentials are a
/// 401.
pub async fn authenticate(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user = header_str(&headers, "X-Auth-User");
    let key = header_str(&headers, "X-Auth-Key");
    let expected_user = format!("{}:{}", state.account, state.user);
    if user.as_deref() != Some(expected_user.as_str()) || key.as_deref() != Some(state.key.as_str())
    {
        return Err(AppError::unauthorized("bad credentials"));
    }

    let token = format!("AUTH_tk{}", Uuid::new_v4().simple());
    state.insert_token(token.clone());

    let mut response = Response::new(Body::empty());
    let response_headers = response.headers_mut();
    response_headers.insert(
        "X-Storage-Url",
        HeaderValue::from_str(&state.storage_url)
            .map_err(|_| AppError::internal("unrepresentable storage URL"))?,
    );
    let token_value =
        HeaderValue::from_str(&token).map_err(|_| AppError::internal("unrepresentable token"))?;
    response_headers.insert("X-Auth-Token", token_value.clone());
    response_headers.insert("X-Storage-Token", token_value);
    Ok(response)
}

/// GET `/v1/{account}` — list containers; `?format=json` for summaries,
/// anything else for newline-separated names (204 when empty).
pub async fn list_containers(
    State(state): State<GatewayState>,
    Path(account): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.check_request(&account, &headers)?;
    let summaries = state.store.list_containers().await?;

    if query.format.as_deref() == Some("json") {
        return Ok(Json(summaries).into_response());
    }
    if summaries.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let mut text = String::new();
    for summary in &summaries {
        text.push_str(&summary.name);
        text.push('\n');
    }
    Ok(plain_text(text))
}

/// PUT `/v1/{account}/{container}` — create container. Idempotent:
/// 201 created, 202 already existed. Accepts `X-Versions-Location`.
pub async fn create_container(
    State(state): State<GatewayState>,
    Path((account, container)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.check_request(&account, &headers)?;
    let versions_location = header_str(&headers, "X-Versions-Location");
    let created = state
        .store
        .create_container(&container, versions_location)
        .await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };
    Ok(status.into_response())
}

/// HEAD `/v1/{account}/{container}` — object count and byte total.
pub async fn head_container(
    State(state): State<GatewayState>,
    Path((account, container)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.check_request(&account, &headers)?;
    let info = state.store.container_stat(&container).await?;

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    let response_headers = response.headers_mut();
    insert_header(
        response_headers,
        "X-Container-Object-Count",
        &info.object_count.to_string(),
    )?;
    insert_header(
        response_headers,
        "X-Container-Bytes-Used",
        &info.bytes_used.to_string(),
    )?;
    Ok(response)
}

/// DELETE `/v1/{account}/{container}` — 204; 409 when not empty.
pub async fn delete_container(
    State(state): State<GatewayState>,
    Path((account, container)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.check_request(&account, &headers)?;
    state.store.delete_container(&container).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// GET `/v1/{account}/{container}` — list objects. `path` restricts to
/// direct children of one level, `prefix` filters by name prefix,
/// `format` selects plain (204 when empty), json, or xml.
pub async fn list_objects(
    State(state): State<GatewayState>,
    Path((account, container)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.check_request(&account, &headers)?;
    let records = state
        .store
        .list_objects(&container, query.path.as_deref(), query.prefix.as_deref())
        .await?;

    match query.format.as_deref() {
        Some("json") => Ok(Json(records).into_response()),
        Some("xml") => {
            let xml = build_listing_xml(&container, &records);
            let mut response = Response::new(Body::from(xml));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/xml"),
            );
            Ok(response)
        }
        _ => {
            if records.is_empty() {
                return Ok(StatusCode::NO_CONTENT.into_response());
            }
            let mut text = String::new();
            for record in &records {
                text.push_str(&record.name);
                text.push('\n');
            }
            Ok(plain_text(text))
        }
    }
}

/// PUT `/v1/{account}/{container}/{*object}` — streamed upload; 201
/// with the payload ETag. `X-Object-Manifest` declares a dynamic large
/// object.
pub async fn put_object(
    State(state): State<GatewayState>,
    Path((account, container, key)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, AppError> {
    state.check_request(&account, &headers)?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let manifest = header_str(&headers, "X-Object-Manifest");

    let stream = body
        .into_data_stream()
        .map(|chunk| chunk.map_err(io::Error::other));

    let etag = state
        .store
        .put_object(&container, &key, content_type, manifest, stream)
        .await?;

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::CREATED;
    insert_header(response.headers_mut(), "ETag", &etag)?;
    Ok(response)
}

/// GET `/v1/{account}/{container}/{*object}` — streamed download. A
/// manifest object's body is its segments concatenated in name order.
pub async fn get_object(
    State(state): State<GatewayState>,
    Path((account, container, key)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.check_request(&account, &headers)?;
    let (info, plan) = state.store.read_object(&container, &key).await?;

    let body = match plan {
        ReadPlan::Empty => Body::empty(),
        ReadPlan::Whole(path) => {
            let file = tokio::fs::File::open(&path).await.map_err(|err| {
                if err.kind() == io::ErrorKind::NotFound {
                    AppError::not_found(format!("object `{key}` not found"))
                } else {
                    AppError::internal(err.to_string())
                }
            })?;
            Body::from_stream(ReaderStream::new(file))
        }
        ReadPlan::Segments(paths) => {
            // Segment sets on this surface are small; assemble in memory.
            let mut data = Vec::with_capacity(info.content_length as usize);
            for path in paths {
                let chunk = tokio::fs::read(&path)
                    .await
                    .map_err(|err| AppError::internal(err.to_string()))?;
                data.extend_from_slice(&chunk);
            }
            Body::from(data)
        }
    };

    let mut response = Response::new(body);
    set_object_headers(response.headers_mut(), &info)?;
    Ok(response)
}

/// HEAD `/v1/{account}/{container}/{*object}` — same headers as GET but
/// no body.
pub async fn head_object(
    State(state): State<GatewayState>,
    Path((account, container, key)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.check_request(&account, &headers)?;
    let info = state.store.head_object(&container, &key).await?;
    let mut response = Response::new(Body::empty());
    set_object_headers(response.headers_mut(), &info)?;
    Ok(response)
}

/// DELETE `/v1/{account}/{container}/{*object}` — 204. In a versioned
/// container the newest retained version becomes current.
pub async fn delete_object(
    State(state): State<GatewayState>,
    Path((account, container, key)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.check_request(&account, &headers)?;
    state.store.delete_object(&container, &key).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| AppError::internal(format!("unrepresentable {name} header")))?;
    headers.insert(name, value);
    Ok(())
}

fn plain_text(text: String) -> Response {
    let mut response = Response::new(Body::from(text));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn set_object_headers(headers: &mut HeaderMap, info: &ObjectInfo) -> Result<(), AppError> {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&info.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&info.content_length.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    // Bare MD5 hex, Swift style; clients that expect S3 quoting strip it.
    insert_header(headers, "ETag", &info.etag)?;
    headers.insert(
        header::LAST_MODIFIED,
        HeaderValue::from_str(&info.last_modified)
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    Ok(())
}

fn build_listing_xml(container: &str, records: &[ObjectRecord]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push_str(&format!(r#"<container name="{}">"#, xml_escape(container)));
    for record in records {
        xml.push_str("<object>");
        xml.push_str(&format!("<name>{}</name>", xml_escape(&record.name)));
        xml.push_str(&format!("<hash>{}</hash>", xml_escape(&record.hash)));
        xml.push_str(&format!("<bytes>{}</bytes>", record.bytes));
        xml.push_str(&format!(
            "<content_type>{}</content_type>",
            xml_escape(&record.content_type)
        ));
        xml.push_str(&format!(
            "<last_modified>{}</last_modified>",
            xml_escape(&record.last_modified)
        ));
        xml.push_str("</object>");
    }
    xml.push_str("</container>");
    xml
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
