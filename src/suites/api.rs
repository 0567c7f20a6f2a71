//! `APITest`: HTTP verb calls against a mocked transport.
//!
//! No request leaves the process. Each unit patches the verb it exercises with
//! a canned response; the mock records every call so units can check what was
//! sent.

use std::collections::HashMap;
use std::fmt;

use serde_json::{json, Value};

use crate::assertion::{contains, equals};
use crate::diagnostics::{Fault, HarnessResult, UnitResult};
use crate::registry::Registry;

const BASE_URL: &str = "https://api.example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    body: Option<Value>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn json(&self) -> Result<&Value, Fault> {
        self.body
            .as_ref()
            .ok_or_else(|| Fault::new(format!("{} response has no JSON body", self.status)))
    }
}

/// Records requests and answers them with the response patched in for their verb.
#[derive(Debug, Default)]
pub struct MockTransport {
    patched: HashMap<Method, Response>,
    calls: Vec<Request>,
}

impl MockTransport {
    pub fn patch(&mut self, method: Method, response: Response) {
        self.patched.insert(method, response);
    }

    pub fn calls(&self) -> &[Request] {
        &self.calls
    }

    fn send(&mut self, request: Request) -> Result<Response, Fault> {
        let response = self
            .patched
            .get(&request.method)
            .cloned()
            .ok_or_else(|| Fault::new(format!("no mock patched for {}", request.method)))?;
        tracing::trace!(method = %request.method, url = %request.url, status = response.status, "mock request");
        self.calls.push(request);
        Ok(response)
    }

    pub fn get(&mut self, url: &str) -> Result<Response, Fault> {
        self.send(Request {
            method: Method::Get,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        })
    }

    pub fn post(&mut self, url: &str, headers: &[(String, String)], data: String) -> Result<Response, Fault> {
        self.send(Request {
            method: Method::Post,
            url: url.to_string(),
            headers: headers.to_vec(),
            body: Some(data),
        })
    }

    pub fn put(&mut self, url: &str, headers: &[(String, String)], data: String) -> Result<Response, Fault> {
        self.send(Request {
            method: Method::Put,
            url: url.to_string(),
            headers: headers.to_vec(),
            body: Some(data),
        })
    }

    pub fn delete(&mut self, url: &str) -> Result<Response, Fault> {
        self.send(Request {
            method: Method::Delete,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct ApiFixture {
    base_url: String,
    headers: Vec<(String, String)>,
    test_data: Value,
    mock: MockTransport,
}

impl ApiFixture {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// `test_data` with an `id` field merged in.
fn with_id(id: u64, data: &Value) -> Value {
    let mut merged = json!({ "id": id });
    if let (Some(target), Some(fields)) = (merged.as_object_mut(), data.as_object()) {
        target.extend(fields.clone());
    }
    merged
}

pub fn register(registry: &mut Registry) -> HarnessResult<()> {
    registry
        .suite::<ApiFixture>("APITest")?
        .setup(|api| {
            api.base_url = BASE_URL.to_string();
            api.headers = vec![("Content-Type".to_string(), "application/json".to_string())];
            api.test_data = json!({
                "name": "Test User",
                "email": "test@example.com",
                "age": 25
            });
            Ok(())
        })
        .unit("test_get_request", get_request)?
        .unit("test_post_request", post_request)?
        .unit("test_put_request", put_request)?
        .unit("test_delete_request", delete_request)?
        .unit("test_error_handling", error_handling)?;
    Ok(())
}

fn get_request(api: &mut ApiFixture) -> UnitResult {
    api.mock.patch(
        Method::Get,
        Response::new(200).with_json(json!({ "id": 1, "name": "John Doe" })),
    );

    let url = api.url("/users/1");
    let response = api.mock.get(&url)?;

    equals(200, response.status)?;
    let data = response.json()?;
    contains("id", data)?;
    contains("name", data)?;
    equals(Some("John Doe"), data["name"].as_str())?;
    equals(1, api.mock.calls().len())?;
    equals(url, api.mock.calls()[0].url.clone())?;
    Ok(())
}

fn post_request(api: &mut ApiFixture) -> UnitResult {
    let created = with_id(2, &api.test_data);
    api.mock
        .patch(Method::Post, Response::new(201).with_json(created));

    let url = api.url("/users");
    let payload = serde_json::to_string(&api.test_data)?;
    let response = api.mock.post(&url, &api.headers, payload)?;

    equals(201, response.status)?;
    let data = response.json()?;
    contains("id", data)?;
    equals(&api.test_data["name"], &data["name"])?;
    equals(&api.test_data["email"], &data["email"])?;

    let sent = &api.mock.calls()[0];
    equals(api.headers.clone(), sent.headers.clone())?;
    let sent_body: Value = serde_json::from_str(sent.body.as_deref().unwrap_or("null"))?;
    equals(&api.test_data, &sent_body)?;
    Ok(())
}

fn put_request(api: &mut ApiFixture) -> UnitResult {
    let mut updated = api.test_data.clone();
    updated["age"] = json!(26);
    api.mock
        .patch(Method::Put, Response::new(200).with_json(with_id(1, &updated)));

    let url = api.url("/users/1");
    let payload = serde_json::to_string(&updated)?;
    let response = api.mock.put(&url, &api.headers, payload)?;

    equals(200, response.status)?;
    equals(Some(26), response.json()?["age"].as_u64())?;
    Ok(())
}

fn delete_request(api: &mut ApiFixture) -> UnitResult {
    api.mock.patch(Method::Delete, Response::new(204));

    let url = api.url("/users/1");
    let response = api.mock.delete(&url)?;

    equals(204, response.status)?;
    equals(Method::Delete, api.mock.calls()[0].method)?;
    Ok(())
}

fn error_handling(api: &mut ApiFixture) -> UnitResult {
    api.mock.patch(
        Method::Get,
        Response::new(404).with_json(json!({ "error": "User not found" })),
    );

    let url = api.url("/users/9999");
    let response = api.mock.get(&url)?;

    equals(404, response.status)?;
    contains("error", response.json()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{Outcome, Runner};

    #[test]
    fn every_unit_passes() {
        let mut registry = Registry::new();
        register(&mut registry).unwrap();
        let summary = Runner::run(registry.all_units());
        assert_eq!(summary.counts().total(), 5);
        for (unit, outcome) in summary.outcomes() {
            assert_eq!(outcome, &Outcome::Passed, "{}", unit.qualified_name());
        }
    }

    #[test]
    fn unpatched_verb_is_a_fault() {
        let mut mock = MockTransport::default();
        let fault = mock.get("https://api.example.com/users/1").unwrap_err();
        assert_eq!(fault.message(), "no mock patched for GET");
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn bodyless_response_has_no_json() {
        assert!(Response::new(204).json().is_err());
    }

    #[test]
    fn with_id_merges_fields() {
        let merged = with_id(2, &json!({ "name": "Test User" }));
        assert_eq!(merged, json!({ "id": 2, "name": "Test User" }));
    }
}
