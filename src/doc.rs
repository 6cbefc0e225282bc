//! Serde document types mirroring the `langspec.json` wire format.
//!
//! These are the unvalidated JSON shapes; [`crate::schema`] checks the rules
//! serde cannot express, [`crate::parse`] lowers documents to builders, and
//! [`crate::serialize`] raises the model back into documents. Struct field
//! order is the canonical key order.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::primitives::AttackStepType;

/// Deserializes into `Some(inner)` so that an absent key (`None`) stays
/// distinguishable from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct LangDocument {
    pub format_version: String,
    pub defines: IndexMap<String, String>,
    pub categories: Vec<CategoryDocument>,
    pub assets: Vec<AssetDocument>,
    pub associations: Vec<AssociationDocument>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CategoryDocument {
    pub name: String,
    pub meta: IndexMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct AssetDocument {
    pub name: String,
    pub meta: IndexMap<String, String>,
    pub category: String,
    pub is_abstract: bool,
    /// Always emitted, possibly `null`; `None` means the key was absent.
    #[serde(default, deserialize_with = "double_option")]
    pub super_asset: Option<Option<String>>,
    pub variables: Vec<VariableDocument>,
    pub attack_steps: Vec<AttackStepDocument>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct VariableDocument {
    pub name: String,
    pub step_expression: StepExpressionDocument,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct AttackStepDocument {
    pub name: String,
    pub meta: IndexMap<String, String>,
    #[serde(rename = "type")]
    pub step_type: AttackStepType,
    pub tags: Vec<String>,
    /// Absent or `null` means no local risk.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub risk: Option<Option<RiskDocument>>,
    /// Absent means no local TTC; `null` means the explicit empty TTC.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ttc: Option<Option<TtcDocument>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub requires: Option<Option<StepsDocument>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub reaches: Option<Option<StepsDocument>>,
}

/// Risk is accepted both as the canonical tag array and as an object of three
/// booleans; the serializer always emits the array form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RiskDocument {
    Tags(Vec<RiskTag>),
    #[serde(rename_all = "camelCase")]
    Flags {
        is_confidentiality: bool,
        is_integrity: bool,
        is_availability: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RiskTag {
    Confidentiality,
    Integrity,
    Availability,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct StepsDocument {
    pub overrides: bool,
    pub step_expressions: Vec<StepExpressionDocument>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub(crate) enum StepExpressionDocument {
    Union {
        lhs: Box<StepExpressionDocument>,
        rhs: Box<StepExpressionDocument>,
    },
    Intersection {
        lhs: Box<StepExpressionDocument>,
        rhs: Box<StepExpressionDocument>,
    },
    Difference {
        lhs: Box<StepExpressionDocument>,
        rhs: Box<StepExpressionDocument>,
    },
    Collect {
        lhs: Box<StepExpressionDocument>,
        rhs: Box<StepExpressionDocument>,
    },
    Transitive {
        #[serde(rename = "stepExpression")]
        step_expression: Box<StepExpressionDocument>,
    },
    SubType {
        #[serde(rename = "subType")]
        sub_type: String,
        #[serde(rename = "stepExpression")]
        step_expression: Box<StepExpressionDocument>,
    },
    Field {
        name: String,
    },
    AttackStep {
        name: String,
    },
    Variable {
        name: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub(crate) enum TtcDocument {
    Addition {
        lhs: Box<TtcDocument>,
        rhs: Box<TtcDocument>,
    },
    Subtraction {
        lhs: Box<TtcDocument>,
        rhs: Box<TtcDocument>,
    },
    Multiplication {
        lhs: Box<TtcDocument>,
        rhs: Box<TtcDocument>,
    },
    Division {
        lhs: Box<TtcDocument>,
        rhs: Box<TtcDocument>,
    },
    Exponentiation {
        lhs: Box<TtcDocument>,
        rhs: Box<TtcDocument>,
    },
    Function {
        name: String,
        arguments: Vec<f64>,
    },
    Number {
        value: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct AssociationDocument {
    pub name: String,
    pub meta: IndexMap<String, String>,
    pub left_asset: String,
    pub left_field: String,
    pub left_multiplicity: MultiplicityDocument,
    pub right_asset: String,
    pub right_field: String,
    pub right_multiplicity: MultiplicityDocument,
}

/// `max` is omitted (or `null`) for an infinite upper bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MultiplicityDocument {
    pub min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}
