//! railstart Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for railstart,
//! an idempotent patcher that bootstraps freshly generated Rails
//! applications, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          railstart-cli (CLI)            │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │             (PatchService)              │
//! │      Applies mutations, runs recipes    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │   (Driven: Filesystem, CommandRunner)   │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    railstart-adapters (Infrastructure)  │
//! │  (LocalFilesystem, SystemRunner, etc)   │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (Anchor, Mutation, Recipe, Severity)   │
//! │          No I/O of any kind             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use railstart_core::prelude::*;
//!
//! let config = PatchConfig::new("./blog").with_template_root("./templates/jumpstart");
//! let service = PatchService::new(config, filesystem, runner);
//!
//! let insertion = TextInsertion::new(
//!     "config/routes.rb",
//!     Anchor::line("Rails.application.routes.draw do"),
//!     "  resources :announcements, only: [:index]",
//!     Position::After,
//! );
//! service.insert_text(&insertion)?;
//! ```

pub mod application;
pub mod domain;
pub mod error;

/// Public API - what external crates should use.
pub mod prelude {
    pub use crate::application::{
        PatchConfig, PatchService, RunObserver,
        ports::{CapturedOutput, CommandRunner, CommandStatus, Filesystem, Invocation},
    };
    pub use crate::domain::{
        Anchor, ConstraintPolicy, DependencySpec, FailurePolicy, FileTarget, FlashMessage,
        GeneratorSpec, Mutation, Notification, Outcome, PackageScript, Position, Recipe,
        RunReport, Severity, ShellSpec, Step, StepStatus, TextInsertion, TextReplacement,
    };
    pub use crate::error::{RailstartError, RailstartResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
