//! Typed remote method descriptions
//!
//! A [`RemoteMethod`] is a plain struct whose fields are the call's parameters
//! and whose associated types say what the call returns. Every engine takes
//! one through `invoke`, so the method name, parameter shape and result type
//! live in one place and are checked at compile time.
//!
//! Usually derived:
//!
//! ```rust,ignore
//! use rpcall_macros::RemoteMethod;
//!
//! #[derive(RemoteMethod)]
//! #[rpc(name = "wait", result = f64)]
//! struct Wait {
//!     seconds: f64,
//! }
//!
//! let waited: f64 = client.invoke(&Wait { seconds: 0.5 }).await?;
//! ```

use crate::error::{Error, Result};
use crate::types::Params;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Schema of one remote method
pub trait RemoteMethod {
    /// Method name sent on the wire
    const NAME: &'static str;

    /// Type the `result` member deserializes into
    type Output: DeserializeOwned;

    /// Parameters for this invocation, or `None` to omit `params`
    fn params(&self) -> Result<Option<Params>>;
}

/// Deserialize a call's result into the method's output type
pub fn decode_output<M: RemoteMethod>(value: Value) -> Result<M::Output> {
    serde_json::from_value(value).map_err(|e| {
        Error::Serialization(format!("result of '{}' has unexpected shape: {}", M::NAME, e))
    })
}
