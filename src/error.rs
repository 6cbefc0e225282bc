use crate::primitives::AttackStepType;
use thiserror::Error;

/// Error produced while building, linking, parsing, or serializing a language.
///
/// Builders collect unresolved by-name references, so most of these surface
/// from [`LangBuilder::build`](crate::builder::LangBuilder::build); the codec
/// variants surface from the JSON and archive entry points. A failed build
/// never exposes a partially linked language.
#[derive(Debug, Error)]
pub enum LangError {
    /// A name does not match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("\"{0}\" is not a valid identifier")]
    InvalidIdentifier(String),

    /// Two entities of the same kind share a name within one scope.
    #[error("duplicate {kind} \"{name}\"")]
    DuplicateName { kind: &'static str, name: String },

    /// A by-name reference does not resolve.
    #[error("{kind} \"{name}\" not found")]
    UnknownReference { kind: &'static str, name: String },

    /// The super-asset relation contains a cycle.
    #[error("super asset cycle: {}", .path.join(" -> "))]
    SuperAssetCycle { path: Vec<String> },

    /// A variable references another variable whose target asset is not yet
    /// resolved. Variables are linked in declaration order without reordering.
    #[error("variable \"{asset}.{variable}\" references a variable that is not yet resolved")]
    VariableCycle { asset: String, variable: String },

    /// No least upper bound exists for the targets of a set operation.
    #[error("assets \"{lhs}\" and \"{rhs}\" have no common super asset")]
    NoCommonSuperAsset { lhs: String, rhs: String },

    /// The asset named in a `subType` step is not a subtype of the inner
    /// expression's target.
    #[error("asset \"{sub}\" is not a subtype of asset \"{sup}\"")]
    IncompatibleSubType { sub: String, sup: String },

    /// The inner expression of a `transitive` step does not have equal source
    /// and target assets.
    #[error(
        "transitive step expression in asset \"{asset}\" must have equal source and target, \
         got \"{src}\" and \"{target}\""
    )]
    TransitiveNonUniform {
        asset: String,
        src: String,
        target: String,
    },

    /// An attack step overrides a super attack step of a different type.
    #[error(
        "attack step \"{asset}.{name}\" has type {actual} but its super attack step has type {expected}"
    )]
    StepTypeMismatch {
        asset: String,
        name: String,
        expected: AttackStepType,
        actual: AttackStepType,
    },

    /// `requires` is only permitted on exist and not-exist steps.
    #[error("attack step \"{asset}.{name}\" of type {kind} cannot have requires")]
    RequiresOnNonExistenceStep {
        asset: String,
        name: String,
        kind: AttackStepType,
    },

    /// An `attackStep(…)` node occurs outside tail position of a top-level
    /// `requires`/`reaches` expression.
    #[error(
        "attack step reference \"{name}\" in asset \"{asset}\" is only allowed at the end of a \
         requires or reaches expression"
    )]
    MisplacedAttackStep { asset: String, name: String },

    /// A top-level `reaches` expression does not end in an `attackStep(…)` node.
    #[error(
        "reaches expression of attack step \"{asset}.{attack_step}\" does not end in an attack \
         step reference"
    )]
    ReachesNotAttackStep { asset: String, attack_step: String },

    /// Arguments fail a distribution's arity or range constraints.
    #[error("invalid arguments for distribution \"{0}\"")]
    InvalidDistributionArguments(String),

    /// A TTC number literal is NaN or infinite.
    #[error("TTC numbers must be finite")]
    NonFiniteNumber,

    /// The empty TTC appears as an operand instead of as the entire
    /// expression.
    #[error("the empty TTC expression is only allowed at the top level")]
    NestedEmptyTtc,

    /// A multiplicity outside min ∈ {0, 1}, max ∈ {1, ∞}.
    #[error("invalid multiplicity: min {min}, max {max:?}")]
    InvalidMultiplicity { min: u32, max: Option<u32> },

    /// The `defines` map is missing a required key (`id` or `version`).
    #[error("missing define \"{0}\"")]
    MissingDefine(&'static str),

    /// A JSON document does not conform to the `langspec.json` schema.
    #[error("schema violation at {path}: {reason}")]
    SchemaViolation { path: String, reason: String },

    /// The archive does not contain a `langspec.json` entry.
    #[error("file \"langspec.json\" not found in archive")]
    ArchiveMissingLangSpec,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LangError {
    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        LangError::SchemaViolation {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Error produced when querying the mean TTC or mean probability of a TTC
/// expression.
///
/// These are query-time failures, distinct from the build-time validation in
/// [`LangError`]: a distribution that supports neither operation is still a
/// valid part of a language.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TtcError {
    /// The named distribution is not in the catalog.
    #[error("distribution \"{0}\" not found")]
    UnknownDistribution(String),

    /// The arguments are invalid for the distribution.
    #[error("invalid arguments for distribution \"{0}\"")]
    InvalidArguments(String),

    /// The distribution or expression form does not define this mean.
    #[error("{operation} is not supported for this TTC expression")]
    Unsupported { operation: &'static str },
}
