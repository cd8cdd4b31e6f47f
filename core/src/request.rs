use thiserror::Error;

use crate::path::{PathError, ResourcePath, Version, parse_path};
use crate::query::{ParseContext, Query, QueryError, ValidationError, parse_query};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("url {url} is not below the service root {service_root_url}")]
    OutsideServiceRoot {
        url: String,
        service_root_url: String,
    },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A parsed and validated request target.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub path: ResourcePath,
    pub query: Query,
}

/// Parses the path and the query string of one request and validates the
/// query against the entity type the path addresses.
pub fn parse_request(
    ctx: &ParseContext<'_>,
    service_root_url: &str,
    version: Version,
    path: &str,
    query: &str,
) -> Result<Request, RequestError> {
    let path = parse_path(ctx.registry, service_root_url, version, path)?;
    let query = parse_query(query, ctx)?;
    query.validate(ctx.registry, path.main_entity_type(ctx.registry))?;
    log::debug!(
        "request {} resolved to {}",
        path.raw_path(),
        path.main_entity_type(ctx.registry).name()
    );
    Ok(Request { path, query })
}

/// Parses a full request URL of the form
/// `<service root>/<version>/<resource path>[?<query>]`.
pub fn parse_url(
    ctx: &ParseContext<'_>,
    service_root_url: &str,
    url: &str,
) -> Result<Request, RequestError> {
    let root = service_root_url.trim_end_matches('/');
    let outside = || RequestError::OutsideServiceRoot {
        url: url.to_string(),
        service_root_url: service_root_url.to_string(),
    };
    let rest = url.strip_prefix(root).ok_or_else(outside)?;
    let rest = rest.strip_prefix('/').ok_or_else(outside)?;
    let (target, query) = rest.split_once('?').unwrap_or((rest, ""));
    let (version, path) = match target.split_once('/') {
        Some((version, _)) => (version, &target[version.len()..]),
        None => (target, ""),
    };
    let version: Version = version.parse()?;
    parse_request(ctx, service_root_url, version, path, query)
}
