//! Request dispatch for the CLI
//!
//! `handle` runs a request against the record service; `explain` only
//! compiles it. Service failures become error responses, not CLI errors.

use serde::Serialize;
use serde_json::Value;

use super::errors::CliResult;
use super::io::{write_errors, write_response};
use super::request::Request;
use crate::compiler::{CommandOptions, CompiledCommand, CompiledQuery};
use crate::records::{RecordService, ServiceError, ServiceResult};

/// Outcome of one request
#[derive(Debug)]
pub enum Response {
    Success(Value),
    Failure(ServiceError),
}

impl Response {
    /// Write the response as one JSON line on stdout
    pub fn write(&self) -> CliResult<()> {
        match self {
            Response::Success(data) => write_response(data.clone()),
            Response::Failure(e) => write_errors(e.code(), &e.messages()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }
}

/// Compiled form of an update: which records, and what to write
#[derive(Debug, Serialize)]
struct UpdatePlan {
    query: CompiledQuery,
    command: CompiledCommand,
}

/// Execute a request
pub async fn handle(service: &RecordService, request: Request) -> CliResult<Response> {
    match request {
        Request::Find(q) => respond(
            service
                .find(&q.record_space, &q.flat_query(), q.conjunction)
                .await,
        ),
        Request::FindOne(q) => respond(
            service
                .find_one(&q.record_space, &q.flat_query(), q.conjunction)
                .await,
        ),
        Request::Create(c) => respond(service.create(&c.record_space, &c.body).await),
        Request::Update(u) => respond(
            service
                .update(
                    &u.target.record_space,
                    &u.target.flat_query(),
                    u.target.conjunction,
                    &u.body,
                )
                .await,
        ),
        Request::Delete(q) => respond(
            service
                .delete(&q.record_space, &q.flat_query(), q.conjunction)
                .await
                .map(|deleted| serde_json::json!({ "deleted": deleted })),
        ),
    }
}

/// Compile a request without touching stored records
pub async fn explain(service: &RecordService, request: Request) -> CliResult<Response> {
    match request {
        Request::Find(q) | Request::FindOne(q) | Request::Delete(q) => respond(
            service.compile_query(&q.record_space, &q.flat_query(), q.conjunction),
        ),
        Request::Create(c) => respond(
            service
                .compile_command(&c.record_space, &c.body, CommandOptions::create())
                .await,
        ),
        Request::Update(u) => {
            let plan = explain_update(service, &u).await;
            respond(plan)
        }
    }
}

async fn explain_update(
    service: &RecordService,
    request: &super::request::UpdateRequest,
) -> ServiceResult<UpdatePlan> {
    let query = service.compile_query(
        &request.target.record_space,
        &request.target.flat_query(),
        request.target.conjunction,
    )?;
    let options = CommandOptions {
        required_fields_are_optional: true,
        active_record: None,
        validate_only: false,
    };
    let command = service
        .compile_command(&request.target.record_space, &request.body, options)
        .await?;
    Ok(UpdatePlan { query, command })
}

fn respond<T: Serialize>(outcome: ServiceResult<T>) -> CliResult<Response> {
    match outcome {
        Ok(data) => Ok(Response::Success(serde_json::to_value(data)?)),
        Err(e) => Ok(Response::Failure(e)),
    }
}
