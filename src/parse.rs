//! `langspec.json` → [`LangBuilder`] lowering.
//!
//! Parsing reconstructs builders exactly, preserving declaration order; it
//! performs no linking. Chain with [`LangBuilder::build`] to obtain a
//! [`Lang`](crate::lang::Lang).

use crate::builder::{
    AssetBuilder, AssociationBuilder, AttackStepBuilder, CategoryBuilder, LangBuilder,
    StepExpressionBuilder, StepsBuilder, VariableBuilder,
};
use crate::doc::{
    AssetDocument, AssociationDocument, AttackStepDocument, CategoryDocument, LangDocument,
    RiskDocument, RiskTag, StepExpressionDocument, StepsDocument, TtcDocument,
};
use crate::error::LangError;
use crate::primitives::{Multiplicity, Risk};
use crate::schema;
use crate::ttc::TtcExpression;

/// Parses a `langspec.json` string into a [`LangBuilder`].
///
/// # Errors
///
/// Returns [`LangError::Json`] on malformed JSON and
/// [`LangError::SchemaViolation`] on a well-formed document that does not
/// conform to the schema.
pub fn parse(input: &str) -> Result<LangBuilder, LangError> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    parse_value(&value)
}

/// Parses an in-memory JSON value into a [`LangBuilder`].
///
/// # Errors
///
/// Returns [`LangError::SchemaViolation`] if the value does not conform to
/// the schema.
pub fn parse_value(value: &serde_json::Value) -> Result<LangBuilder, LangError> {
    let document: LangDocument = serde_json::from_value(value.clone())
        .map_err(|e| LangError::schema("$", e.to_string()))?;
    parse_document(document)
}

pub(crate) fn parse_document(document: LangDocument) -> Result<LangBuilder, LangError> {
    schema::validate(&document)?;

    let mut builder = LangBuilder::new();
    for (key, value) in document.defines {
        builder = builder.define(key, value);
    }
    for category in document.categories {
        builder = builder.category(lower_category(category));
    }
    for asset in document.assets {
        builder = builder.asset(lower_asset(asset));
    }
    for association in document.associations {
        builder = builder.association(lower_association(association)?);
    }
    Ok(builder)
}

fn lower_category(document: CategoryDocument) -> CategoryBuilder {
    let mut builder = CategoryBuilder::new(document.name);
    for (key, value) in document.meta {
        builder = builder.meta(key, value);
    }
    builder
}

fn lower_asset(document: AssetDocument) -> AssetBuilder {
    let mut builder =
        AssetBuilder::new(document.name, document.category).is_abstract(document.is_abstract);
    for (key, value) in document.meta {
        builder = builder.meta(key, value);
    }
    if let Some(Some(super_asset)) = document.super_asset {
        builder = builder.super_asset(super_asset);
    }
    for variable in document.variables {
        builder = builder.variable(VariableBuilder::new(
            variable.name,
            lower_step_expression(variable.step_expression),
        ));
    }
    for attack_step in document.attack_steps {
        builder = builder.attack_step(lower_attack_step(attack_step));
    }
    builder
}

fn lower_attack_step(document: AttackStepDocument) -> AttackStepBuilder {
    let mut builder = AttackStepBuilder::new(document.name, document.step_type);
    for (key, value) in document.meta {
        builder = builder.meta(key, value);
    }
    for tag in document.tags {
        builder = builder.tag(tag);
    }
    if let Some(Some(risk)) = document.risk {
        builder = builder.risk(lower_risk(risk));
    }
    builder = match document.ttc {
        // An explicit null is the distinguished empty TTC; an absent key
        // means no local TTC at all.
        Some(None) => builder.ttc(TtcExpression::Empty),
        Some(Some(ttc)) => builder.ttc(lower_ttc(ttc)),
        None => builder,
    };
    if let Some(Some(requires)) = document.requires {
        builder = builder.requires(lower_steps(requires));
    }
    if let Some(Some(reaches)) = document.reaches {
        builder = builder.reaches(lower_steps(reaches));
    }
    builder
}

fn lower_risk(document: RiskDocument) -> Risk {
    match document {
        RiskDocument::Flags {
            is_confidentiality,
            is_integrity,
            is_availability,
        } => Risk::new(is_confidentiality, is_integrity, is_availability),
        RiskDocument::Tags(tags) => {
            // Any order and duplicates are accepted on input.
            let mut risk = Risk::default();
            for tag in tags {
                match tag {
                    RiskTag::Confidentiality => risk.confidentiality = true,
                    RiskTag::Integrity => risk.integrity = true,
                    RiskTag::Availability => risk.availability = true,
                }
            }
            risk
        }
    }
}

fn lower_steps(document: StepsDocument) -> StepsBuilder {
    let mut builder = if document.overrides {
        StepsBuilder::overriding()
    } else {
        StepsBuilder::extending()
    };
    for expression in document.step_expressions {
        builder = builder.expression(lower_step_expression(expression));
    }
    builder
}

fn lower_step_expression(document: StepExpressionDocument) -> StepExpressionBuilder {
    match document {
        StepExpressionDocument::Union { lhs, rhs } => {
            StepExpressionBuilder::union(lower_step_expression(*lhs), lower_step_expression(*rhs))
        }
        StepExpressionDocument::Intersection { lhs, rhs } => StepExpressionBuilder::intersection(
            lower_step_expression(*lhs),
            lower_step_expression(*rhs),
        ),
        StepExpressionDocument::Difference { lhs, rhs } => StepExpressionBuilder::difference(
            lower_step_expression(*lhs),
            lower_step_expression(*rhs),
        ),
        StepExpressionDocument::Collect { lhs, rhs } => {
            StepExpressionBuilder::collect(lower_step_expression(*lhs), lower_step_expression(*rhs))
        }
        StepExpressionDocument::Transitive { step_expression } => {
            StepExpressionBuilder::transitive(lower_step_expression(*step_expression))
        }
        StepExpressionDocument::SubType {
            sub_type,
            step_expression,
        } => StepExpressionBuilder::sub_type(sub_type, lower_step_expression(*step_expression)),
        StepExpressionDocument::Field { name } => StepExpressionBuilder::field(name),
        StepExpressionDocument::AttackStep { name } => StepExpressionBuilder::attack_step(name),
        StepExpressionDocument::Variable { name } => StepExpressionBuilder::variable(name),
    }
}

fn lower_ttc(document: TtcDocument) -> TtcExpression {
    match document {
        TtcDocument::Addition { lhs, rhs } => {
            TtcExpression::Addition(Box::new(lower_ttc(*lhs)), Box::new(lower_ttc(*rhs)))
        }
        TtcDocument::Subtraction { lhs, rhs } => {
            TtcExpression::Subtraction(Box::new(lower_ttc(*lhs)), Box::new(lower_ttc(*rhs)))
        }
        TtcDocument::Multiplication { lhs, rhs } => {
            TtcExpression::Multiplication(Box::new(lower_ttc(*lhs)), Box::new(lower_ttc(*rhs)))
        }
        TtcDocument::Division { lhs, rhs } => {
            TtcExpression::Division(Box::new(lower_ttc(*lhs)), Box::new(lower_ttc(*rhs)))
        }
        TtcDocument::Exponentiation { lhs, rhs } => {
            TtcExpression::Exponentiation(Box::new(lower_ttc(*lhs)), Box::new(lower_ttc(*rhs)))
        }
        TtcDocument::Function { name, arguments } => TtcExpression::Function(name, arguments),
        TtcDocument::Number { value } => TtcExpression::Number(value),
    }
}

fn lower_association(document: AssociationDocument) -> Result<AssociationBuilder, LangError> {
    let left_multiplicity =
        Multiplicity::new(document.left_multiplicity.min, document.left_multiplicity.max)?;
    let right_multiplicity = Multiplicity::new(
        document.right_multiplicity.min,
        document.right_multiplicity.max,
    )?;
    let mut builder = AssociationBuilder::new(
        document.name,
        document.left_asset,
        document.left_field,
        left_multiplicity,
        document.right_asset,
        document.right_field,
        right_multiplicity,
    );
    for (key, value) in document.meta {
        builder = builder.meta(key, value);
    }
    Ok(builder)
}
