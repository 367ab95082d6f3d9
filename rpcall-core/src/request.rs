//! Request construction

use crate::error::{Error, Result};
use crate::id::IdAllocator;
use crate::types::{JsonRpcRequest, Params};

/// Build a request for `method`, numbering it from `ids`
///
/// The id is allocated only once the method name has been accepted, so a
/// rejected request never leaves an outstanding id behind. `None` params
/// produce a request without a `params` member; `Some` params are kept
/// exactly as given.
///
/// # Examples
///
/// ```rust
/// use rpcall_core::{build_request, IdAllocator, Params};
/// use serde_json::json;
///
/// let ids = IdAllocator::new();
/// let request = build_request(&ids, "wait", Some(Params::from(vec![json!(1.0)]))).unwrap();
///
/// assert_eq!(request.id, 1);
/// assert!(ids.is_outstanding(1));
/// ```
pub fn build_request(
    ids: &IdAllocator,
    method: &str,
    params: Option<Params>,
) -> Result<JsonRpcRequest> {
    if method.is_empty() {
        return Err(Error::InvalidRequest("method name must not be empty".into()));
    }

    Ok(JsonRpcRequest::new(method.to_string(), params, ids.allocate()))
}
