//! [`Lang`] → `langspec.json` serialization.
//!
//! Output is canonical: top-level keys in schema order, object keys in the
//! schema's required order, arrays in model declaration order, risk in array
//! form, and the empty TTC as JSON `null`. Only local variables, attack
//! steps, and icons are emitted — inherited state is reconstructed by the
//! linker on the way back in.

use crate::doc::{
    AssetDocument, AssociationDocument, AttackStepDocument, CategoryDocument, LangDocument,
    MultiplicityDocument, RiskDocument, RiskTag, StepExpressionDocument, StepsDocument,
    TtcDocument, VariableDocument,
};
use crate::error::LangError;
use crate::lang::{Asset, AttackStep, Lang, Steps, FORMAT_VERSION};
use crate::primitives::{Meta, Multiplicity, Risk};
use crate::step::{StepExpression, StepKind};
use crate::ttc::TtcExpression;
use indexmap::IndexMap;

/// Serializes a language to a pretty-printed (2-space indented) canonical
/// `langspec.json` string.
///
/// # Errors
///
/// Returns [`LangError::Json`] if the underlying writer fails.
pub fn serialize(lang: &Lang) -> Result<String, LangError> {
    Ok(serde_json::to_string_pretty(&to_document(lang))?)
}

/// Serializes a language to an in-memory JSON value in canonical key order.
///
/// # Errors
///
/// Returns [`LangError::Json`] if the conversion fails.
pub fn serialize_value(lang: &Lang) -> Result<serde_json::Value, LangError> {
    Ok(serde_json::to_value(to_document(lang))?)
}

pub(crate) fn to_document(lang: &Lang) -> LangDocument {
    LangDocument {
        format_version: FORMAT_VERSION.to_string(),
        defines: meta_to_map(lang.defines()),
        categories: lang
            .categories()
            .map(|category| CategoryDocument {
                name: category.name().to_string(),
                meta: meta_to_map(category.meta()),
            })
            .collect(),
        assets: lang.assets().map(|asset| asset_to_document(&asset)).collect(),
        associations: lang
            .associations()
            .map(|association| AssociationDocument {
                name: association.name().to_string(),
                meta: meta_to_map(association.meta()),
                left_asset: association.left_field().asset().name().to_string(),
                left_field: association.left_field().name().to_string(),
                left_multiplicity: multiplicity_to_document(association.left_field().multiplicity()),
                right_asset: association.right_field().asset().name().to_string(),
                right_field: association.right_field().name().to_string(),
                right_multiplicity: multiplicity_to_document(
                    association.right_field().multiplicity(),
                ),
            })
            .collect(),
    }
}

fn meta_to_map(meta: &Meta) -> IndexMap<String, String> {
    meta.iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn asset_to_document(asset: &Asset<'_>) -> AssetDocument {
    AssetDocument {
        name: asset.name().to_string(),
        meta: meta_to_map(asset.meta()),
        category: asset.category().name().to_string(),
        is_abstract: asset.is_abstract(),
        super_asset: Some(asset.super_asset().map(|sup| sup.name().to_string())),
        variables: asset
            .local_variables()
            .map(|variable| VariableDocument {
                name: variable.name().to_string(),
                step_expression: expression_to_document(variable.step_expression()),
            })
            .collect(),
        attack_steps: asset
            .local_attack_steps()
            .map(|step| attack_step_to_document(&step))
            .collect(),
    }
}

fn attack_step_to_document(step: &AttackStep<'_>) -> AttackStepDocument {
    AttackStepDocument {
        name: step.name().to_string(),
        meta: meta_to_map(step.meta()),
        step_type: step.kind(),
        tags: step.local_tags().to_vec(),
        risk: step.local_risk().map(|risk| Some(risk_to_document(risk))),
        ttc: step.local_ttc().map(|ttc| match ttc {
            TtcExpression::Empty => None,
            other => Some(ttc_to_document(other)),
        }),
        requires: step
            .local_requires()
            .map(|steps| Some(steps_to_document(steps))),
        reaches: step
            .local_reaches()
            .map(|steps| Some(steps_to_document(steps))),
    }
}

fn risk_to_document(risk: Risk) -> RiskDocument {
    let mut tags = Vec::new();
    if risk.confidentiality {
        tags.push(RiskTag::Confidentiality);
    }
    if risk.integrity {
        tags.push(RiskTag::Integrity);
    }
    if risk.availability {
        tags.push(RiskTag::Availability);
    }
    RiskDocument::Tags(tags)
}

fn steps_to_document(steps: &Steps) -> StepsDocument {
    StepsDocument {
        overrides: steps.overrides(),
        step_expressions: steps
            .expressions()
            .iter()
            .map(expression_to_document)
            .collect(),
    }
}

fn expression_to_document(expression: &StepExpression) -> StepExpressionDocument {
    match expression.kind() {
        StepKind::Union(lhs, rhs) => StepExpressionDocument::Union {
            lhs: Box::new(expression_to_document(lhs)),
            rhs: Box::new(expression_to_document(rhs)),
        },
        StepKind::Intersection(lhs, rhs) => StepExpressionDocument::Intersection {
            lhs: Box::new(expression_to_document(lhs)),
            rhs: Box::new(expression_to_document(rhs)),
        },
        StepKind::Difference(lhs, rhs) => StepExpressionDocument::Difference {
            lhs: Box::new(expression_to_document(lhs)),
            rhs: Box::new(expression_to_document(rhs)),
        },
        StepKind::Collect(lhs, rhs) => StepExpressionDocument::Collect {
            lhs: Box::new(expression_to_document(lhs)),
            rhs: Box::new(expression_to_document(rhs)),
        },
        StepKind::Transitive(inner) => StepExpressionDocument::Transitive {
            step_expression: Box::new(expression_to_document(inner)),
        },
        StepKind::SubType(name, inner) => StepExpressionDocument::SubType {
            sub_type: name.clone(),
            step_expression: Box::new(expression_to_document(inner)),
        },
        StepKind::Field(name) => StepExpressionDocument::Field { name: name.clone() },
        StepKind::AttackStep(name) => StepExpressionDocument::AttackStep { name: name.clone() },
        StepKind::Variable(name) => StepExpressionDocument::Variable { name: name.clone() },
    }
}

fn ttc_to_document(ttc: &TtcExpression) -> TtcDocument {
    match ttc {
        TtcExpression::Addition(lhs, rhs) => TtcDocument::Addition {
            lhs: Box::new(ttc_to_document(lhs)),
            rhs: Box::new(ttc_to_document(rhs)),
        },
        TtcExpression::Subtraction(lhs, rhs) => TtcDocument::Subtraction {
            lhs: Box::new(ttc_to_document(lhs)),
            rhs: Box::new(ttc_to_document(rhs)),
        },
        TtcExpression::Multiplication(lhs, rhs) => TtcDocument::Multiplication {
            lhs: Box::new(ttc_to_document(lhs)),
            rhs: Box::new(ttc_to_document(rhs)),
        },
        TtcExpression::Division(lhs, rhs) => TtcDocument::Division {
            lhs: Box::new(ttc_to_document(lhs)),
            rhs: Box::new(ttc_to_document(rhs)),
        },
        TtcExpression::Exponentiation(lhs, rhs) => TtcDocument::Exponentiation {
            lhs: Box::new(ttc_to_document(lhs)),
            rhs: Box::new(ttc_to_document(rhs)),
        },
        TtcExpression::Function(name, arguments) => TtcDocument::Function {
            name: name.clone(),
            arguments: arguments.clone(),
        },
        TtcExpression::Number(value) => TtcDocument::Number { value: *value },
        // The linker rejects nested empties, and the top-level empty is
        // emitted as null before this point.
        TtcExpression::Empty => TtcDocument::Number { value: 0.0 },
    }
}

fn multiplicity_to_document(multiplicity: Multiplicity) -> MultiplicityDocument {
    MultiplicityDocument {
        min: multiplicity.min(),
        max: multiplicity.max(),
    }
}
