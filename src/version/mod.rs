//! Image tag fetching and latest-version resolution
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│  TagRecord  │────▶│  Resolver   │
//! │  (fetch)    │     │   list      │     │  (latest)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       ▲
//!        ▼                                       │
//! ┌──────────────────┐                    ┌─────────────┐
//! │    Registries    │                    │    Batch    │
//! │(hub,nexus,harbor)│                    │ (fan-out)   │
//! └──────────────────┘                    └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: `TagRegistry` trait for fetching tags from a backend
//! - [`registries`]: DockerHub, Nexus and Harbor implementations plus the factory
//! - [`resolver`]: pure latest-tag selection for `vMAJOR.MINOR[.PATCH]-BUILD` tags
//! - [`batch`]: fetch-then-resolve for many images with a failure policy
//! - [`error`]: registry error type
//! - [`types`]: `TagRecord` and `RegistryKind`

pub mod batch;
pub mod error;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod types;
