pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{directory::RestDirectory, mailbox::RestMailbox};
pub use config::ResolvedConfig;
pub use core::report::{OffboardingReport, OverallStatus};
pub use core::workflow::{OffboardRequest, OffboardingWorkflow};
pub use domain::ports::{ConfigProvider, DirectoryPort, MailboxPort};
pub use utils::error::{OffboardError, Result};
