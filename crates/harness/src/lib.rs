//! Live-server check harness for server-rendered websites
//!
//! The harness boots the site under test as a child process, polls it until
//! it answers, then runs declarative YAML checks against it:
//!
//! - HTTP checks (routes, HTML semantics, static assets, links, contact form)
//!   share one `reqwest` client against the fixture's base URL
//! - browser checks render to Playwright scripts executed through `node`,
//!   with optional visual regression against baseline screenshots
//! - audit checks inject axe-core and judge its violations
//!
//! One `ServerHandle` is shared by every check and torn down exactly once,
//! on every exit path.

pub mod browser;
pub mod checks;
pub mod config;
pub mod error;
pub mod retry;
pub mod runner;
pub mod server;
pub mod spec;
pub mod visual;

pub use config::SiteConfig;
pub use error::{HarnessError, HarnessResult};
pub use runner::{CheckRunner, SuiteResult};
pub use server::{ServerConfig, ServerHandle};
pub use spec::{CheckKind, CheckSpec};
