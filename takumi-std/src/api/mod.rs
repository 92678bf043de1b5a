//! API registration.
//!
//! - [`ApiHandler`]: a handler bound to its resolved configuration
//! - [`ServiceModule`]: a named group of APIs sharing default settings
//! - [`ServiceHandler`]: the application, a module plus a service name and hooks
//!
//! Registration takes `&mut self` and happens at startup. The finished table
//! is frozen into an [`ApiTable`] and shared by every dispatch table.

mod descriptor;
mod module;

pub use descriptor::{ApiHandler, DEFAULT_UNIT};
pub use module::{ServiceHandler, ServiceModule};

use std::collections::HashMap;

/// API name to descriptor.
pub type ApiTable = HashMap<String, ApiHandler>;
