//! Centralized input validation for shelling out to `wg` and `wg-quick`.
//!
//! This crate provides the safe command builder the reconcilers use to
//! mutate live WireGuard interfaces, plus the shared validation error type.
//!
//! # Security Features
//!
//! - **Command injection prevention**: Safe command builder that validates all arguments
//! - **Shell metacharacter rejection**: Blocks null bytes, newlines and carriage returns
//! - **Allowlisted programs**: Only `wg` and `wg-quick` can be invoked
//!
//! # Safe Command Execution
//!
//! ```rust,no_run
//! # #[cfg(feature = "command")]
//! # async fn example() -> Result<(), wgfleet_validation::command::CommandError> {
//! use wgfleet_validation::command::{SafeCommand, AllowedProgram};
//!
//! let output = SafeCommand::new(AllowedProgram::Wg)
//!     .arg("show")
//!     .arg("wg0")
//!     .execute()
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "command")]
pub mod command;
mod error;

#[cfg(feature = "command")]
pub use command::{AllowedProgram, CommandError, CommandOutput, SafeCommand};
pub use error::{ValidationError, ValidationErrorKind};
