//! Procedural macros for rpcall
//!
//! # Available Macros
//!
//! ## `#[derive(RemoteMethod)]` - Typed Remote Method
//!
//! Turns a plain struct into a description of one remote method: its name on
//! the wire, how its fields become JSON-RPC `params`, and the type its result
//! deserializes into. Any rpcall client can then `invoke` it.
//!
//! Without the derive, you'd write:
//!
//! ```ignore
//! impl RemoteMethod for GetBalance {
//!     const NAME: &'static str = "get_balance";
//!     type Output = u64;
//!
//!     fn params(&self) -> Result<Option<Params>> {
//!         Ok(Some(Params::Positional(vec![serde_json::to_value(&self.account)?])))
//!     }
//! }
//! ```
//!
//! With the derive:
//!
//! ```ignore
//! #[derive(RemoteMethod)]
//! #[rpc(result = u64)]
//! struct GetBalance {
//!     account: String,
//! }
//!
//! let balance = client.invoke(&GetBalance { account: "alice".into() }).await?;
//! ```

mod remote_method;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive `rpcall_core::RemoteMethod` for a struct
///
/// # Container Attributes
///
/// - `#[rpc(name = "...")]`: method name on the wire. Defaults to the struct
///   name in snake_case (`GetBalance` -> `get_balance`).
/// - `#[rpc(prefix = "...")]`: prepended to the name, derived or explicit
///   (`prefix = "math."` on `Add` -> `math.add`).
/// - `#[rpc(result = Type)]`: result type. Defaults to `serde_json::Value`.
/// - `#[rpc(by_name)]`: send fields as a keyed object instead of an array in
///   field order. Needs named fields.
/// - `#[rpc(crate = "path")]`: where `RemoteMethod`, `Params` and friends
///   live. Defaults to `::rpcall_core`; use `"rpcall"` through the facade crate.
///
/// # Field Attributes
///
/// - `#[rpc(rename = "...")]`: key for this field under `by_name`
///
/// Unit structs and structs without fields send no `params` member. Every
/// field must implement `serde::Serialize`.
///
/// # Examples
///
/// ```ignore
/// #[derive(RemoteMethod)]
/// #[rpc(name = "eth_getBalance", result = String)]
/// struct EthGetBalance(String, &'static str);
///
/// #[derive(RemoteMethod)]
/// #[rpc(name = "user.lookup", result = User, by_name)]
/// struct Lookup {
///     #[rpc(rename = "userId")]
///     user_id: u64,
/// }
///
/// #[derive(RemoteMethod)]
/// #[rpc(result = u64)]
/// struct Uptime;
/// ```
#[proc_macro_derive(RemoteMethod, attributes(rpc))]
pub fn derive_remote_method(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    remote_method::derive_remote_method(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
