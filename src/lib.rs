//! Object model, linker, and archive codec for MAL-family threat-modeling
//! language descriptors.
//!
//! A language descriptor ([`Lang`]) defines the vocabulary of a threat
//! language at meta-model altitude: asset types and their inheritance,
//! associations between them, attack steps and defenses, step expressions
//! connecting attack steps across the asset graph, and time-to-compromise
//! (TTC) expressions. This crate provides the complete pipeline for working
//! with descriptors:
//!
//! ```text
//! read_archive(mar) → LangBuilder ── build() ──→ Lang → serialize(lang) → json
//!       parse(json) → LangBuilder ──────┘              write_archive(lang) → mar
//! ```
//!
//! Builders are flat, by-name descriptions; [`LangBuilder::build`] runs the
//! two-phase linker that resolves every reference, types every step
//! expression, and either yields a deeply immutable [`Lang`] or a typed
//! [`LangError`]. A built `Lang` can be queried from multiple threads without
//! locking.
//!
//! # Quick Start
//!
//! ```rust
//! use threatlang::{AssetBuilder, AttackStepBuilder, AttackStepType, CategoryBuilder,
//!     LangBuilder, TtcExpression};
//!
//! let lang = LangBuilder::new()
//!     .define("id", "org.example.coreLang")
//!     .define("version", "1.0.0")
//!     .category(CategoryBuilder::new("System"))
//!     .asset(
//!         AssetBuilder::new("Host", "System").attack_step(
//!             AttackStepBuilder::new("connect", AttackStepType::Or)
//!                 .ttc(TtcExpression::function("Exponential", [1.0])),
//!         ),
//!     )
//!     .build()
//!     .expect("valid language");
//!
//! let host = lang.asset("Host").expect("known asset");
//! assert_eq!(host.category().name(), "System");
//! let ttc = host.attack_step("connect").expect("known step").ttc().expect("has TTC");
//! assert_eq!(ttc.mean_ttc(), Ok(1.0));
//! ```
//!
//! Descriptors round-trip through the canonical JSON document
//! (`langspec.json`) and the `.mar` zip archive that carries it together with
//! per-asset icons and license texts.

pub mod archive;
pub mod builder;
pub mod error;
pub mod lang;
pub mod parse;
pub mod primitives;
pub mod serialize;
pub mod step;
pub mod ttc;

mod doc;
mod resolve;
mod schema;

pub use archive::{read_archive, write_archive};
pub use builder::{
    AssetBuilder, AssociationBuilder, AttackStepBuilder, CategoryBuilder, LangBuilder,
    MetaBuilder, StepExpressionBuilder, StepsBuilder, VariableBuilder,
};
pub use error::{LangError, TtcError};
pub use lang::{
    Asset, Association, AttackStep, Category, Field, Lang, Steps, Variable, FORMAT_VERSION,
};
pub use parse::{parse, parse_value};
pub use primitives::{
    check_identifier, is_identifier, AttackStepType, Meta, Multiplicity, Risk,
};
pub use serialize::{serialize, serialize_value};
pub use step::{StepExpression, StepKind};
pub use ttc::{lookup_distribution, Distribution, TtcExpression, DISTRIBUTION_REGISTRY};
