//! Client for a session-cookie authenticated REST backend speaking a fielded
//! (OData-style) query grammar.
//!
//! ```rust,no_run
//! use tagone_client::{Client, ClientConfig, PageRequest, QueryDescription};
//!
//! # async fn example() -> tagone_client::Result<()> {
//! let client = Client::new(ClientConfig::new("https://backoffice.example/api"))?;
//! let claims = client.login("operator", "secret").await?;
//! println!("logged in as {:?}", claims.get("name"));
//!
//! let q = QueryDescription::new()
//!     .select(["Id", "Name"])
//!     .filter(["Active eq true", "Region eq 'EU'"])
//!     .order_by("Name asc")
//!     .expand("Owner", QueryDescription::new().select(["Email"]));
//! let page = client.list::<serde_json::Value>("Customers", Some(q), PageRequest::new(2, 20u32)).await?;
//! println!("{} of {} rows, {} pages", page.data.len(), page.meta.count, page.meta.pages);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod pagination;
pub mod query;
pub mod session;
pub mod transport;

pub use auth::Claims;
pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use executor::ApiRequest;
pub use pagination::{PageMeta, PageRequest, PageSize, PaginatedResult, DEFAULT_PAGE_SIZE, UNBOUNDED_PAGE_SIZE};
pub use query::{to_query_string, Expand, Filter, OrderBy, QueryDescription, Select};
pub use session::{extract_session_token, MemorySessionStore, SessionStore, SessionToken};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
