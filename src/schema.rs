//! Validation of `langspec.json` documents.
//!
//! Serde enforces the structural shape (required keys, value types, closed
//! `type` discriminators); the rules here cover what the schema says beyond
//! that — the `formatVersion` constant, identifier patterns, required defines,
//! multiplicity bounds, and key-presence rules. The first violation wins and
//! is reported with its document path.

use crate::doc::{
    AssetDocument, AssociationDocument, AttackStepDocument, LangDocument, MultiplicityDocument,
    StepExpressionDocument, StepsDocument, TtcDocument,
};
use crate::error::LangError;
use crate::lang::FORMAT_VERSION;
use crate::primitives::is_identifier;
use indexmap::IndexMap;

pub(crate) fn validate(document: &LangDocument) -> Result<(), LangError> {
    if document.format_version != FORMAT_VERSION {
        return Err(LangError::schema(
            "formatVersion",
            format!(
                "must be \"{}\", got \"{}\"",
                FORMAT_VERSION, document.format_version
            ),
        ));
    }

    check_meta(&document.defines, "defines")?;
    for key in ["id", "version"] {
        if !document.defines.contains_key(key) {
            return Err(LangError::schema(
                "defines",
                format!("required key \"{}\" is missing", key),
            ));
        }
    }

    for (i, category) in document.categories.iter().enumerate() {
        let path = format!("categories[{}]", i);
        check_name(&category.name, &path)?;
        check_meta(&category.meta, &format!("{}.meta", path))?;
    }

    for (i, asset) in document.assets.iter().enumerate() {
        check_asset(asset, &format!("assets[{}]", i))?;
    }

    for (i, association) in document.associations.iter().enumerate() {
        check_association(association, &format!("associations[{}]", i))?;
    }

    Ok(())
}

fn check_name(name: &str, path: &str) -> Result<(), LangError> {
    check_identifier_at(name, &format!("{}.name", path))
}

fn check_identifier_at(name: &str, path: &str) -> Result<(), LangError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(LangError::schema(
            path,
            format!("\"{}\" is not a valid identifier", name),
        ))
    }
}

fn check_meta(meta: &IndexMap<String, String>, path: &str) -> Result<(), LangError> {
    for key in meta.keys() {
        check_identifier_at(key, &format!("{}.{}", path, key))?;
    }
    Ok(())
}

fn check_asset(asset: &AssetDocument, path: &str) -> Result<(), LangError> {
    check_name(&asset.name, path)?;
    check_meta(&asset.meta, &format!("{}.meta", path))?;
    check_identifier_at(&asset.category, &format!("{}.category", path))?;
    match &asset.super_asset {
        None => {
            return Err(LangError::schema(
                format!("{}.superAsset", path),
                "key is required (possibly null)",
            ));
        }
        Some(None) => {}
        Some(Some(name)) => check_identifier_at(name, &format!("{}.superAsset", path))?,
    }
    for (i, variable) in asset.variables.iter().enumerate() {
        let variable_path = format!("{}.variables[{}]", path, i);
        check_name(&variable.name, &variable_path)?;
        check_step_expression(
            &variable.step_expression,
            &format!("{}.stepExpression", variable_path),
        )?;
    }
    for (i, step) in asset.attack_steps.iter().enumerate() {
        check_attack_step(step, &format!("{}.attackSteps[{}]", path, i))?;
    }
    Ok(())
}

fn check_attack_step(step: &AttackStepDocument, path: &str) -> Result<(), LangError> {
    check_name(&step.name, path)?;
    check_meta(&step.meta, &format!("{}.meta", path))?;
    for (i, tag) in step.tags.iter().enumerate() {
        let tag_path = format!("{}.tags[{}]", path, i);
        check_identifier_at(tag, &tag_path)?;
        if step.tags[..i].contains(tag) {
            return Err(LangError::schema(tag_path, format!("duplicate tag \"{}\"", tag)));
        }
    }
    if let Some(Some(ttc)) = &step.ttc {
        check_ttc(ttc, &format!("{}.ttc", path))?;
    }
    if let Some(Some(requires)) = &step.requires {
        check_steps(requires, &format!("{}.requires", path))?;
    }
    if let Some(Some(reaches)) = &step.reaches {
        check_steps(reaches, &format!("{}.reaches", path))?;
    }
    Ok(())
}

fn check_steps(steps: &StepsDocument, path: &str) -> Result<(), LangError> {
    for (i, expression) in steps.step_expressions.iter().enumerate() {
        check_step_expression(expression, &format!("{}.stepExpressions[{}]", path, i))?;
    }
    Ok(())
}

fn check_step_expression(
    expression: &StepExpressionDocument,
    path: &str,
) -> Result<(), LangError> {
    match expression {
        StepExpressionDocument::Union { lhs, rhs }
        | StepExpressionDocument::Intersection { lhs, rhs }
        | StepExpressionDocument::Difference { lhs, rhs }
        | StepExpressionDocument::Collect { lhs, rhs } => {
            check_step_expression(lhs, &format!("{}.lhs", path))?;
            check_step_expression(rhs, &format!("{}.rhs", path))
        }
        StepExpressionDocument::Transitive { step_expression } => {
            check_step_expression(step_expression, &format!("{}.stepExpression", path))
        }
        StepExpressionDocument::SubType {
            sub_type,
            step_expression,
        } => {
            check_identifier_at(sub_type, &format!("{}.subType", path))?;
            check_step_expression(step_expression, &format!("{}.stepExpression", path))
        }
        StepExpressionDocument::Field { name }
        | StepExpressionDocument::AttackStep { name }
        | StepExpressionDocument::Variable { name } => {
            check_identifier_at(name, &format!("{}.name", path))
        }
    }
}

fn check_ttc(ttc: &TtcDocument, path: &str) -> Result<(), LangError> {
    match ttc {
        TtcDocument::Addition { lhs, rhs }
        | TtcDocument::Subtraction { lhs, rhs }
        | TtcDocument::Multiplication { lhs, rhs }
        | TtcDocument::Division { lhs, rhs }
        | TtcDocument::Exponentiation { lhs, rhs } => {
            check_ttc(lhs, &format!("{}.lhs", path))?;
            check_ttc(rhs, &format!("{}.rhs", path))
        }
        TtcDocument::Function { name, .. } => {
            check_identifier_at(name, &format!("{}.name", path))
        }
        TtcDocument::Number { .. } => Ok(()),
    }
}

fn check_association(association: &AssociationDocument, path: &str) -> Result<(), LangError> {
    check_name(&association.name, path)?;
    check_meta(&association.meta, &format!("{}.meta", path))?;
    check_identifier_at(&association.left_asset, &format!("{}.leftAsset", path))?;
    check_identifier_at(&association.left_field, &format!("{}.leftField", path))?;
    check_multiplicity(
        &association.left_multiplicity,
        &format!("{}.leftMultiplicity", path),
    )?;
    check_identifier_at(&association.right_asset, &format!("{}.rightAsset", path))?;
    check_identifier_at(&association.right_field, &format!("{}.rightField", path))?;
    check_multiplicity(
        &association.right_multiplicity,
        &format!("{}.rightMultiplicity", path),
    )
}

fn check_multiplicity(
    multiplicity: &MultiplicityDocument,
    path: &str,
) -> Result<(), LangError> {
    if multiplicity.min > 1 {
        return Err(LangError::schema(
            format!("{}.min", path),
            format!("must be 0 or 1, got {}", multiplicity.min),
        ));
    }
    if let Some(max) = multiplicity.max {
        if max != 1 {
            return Err(LangError::schema(
                format!("{}.max", path),
                format!("must be 1 or absent, got {}", max),
            ));
        }
    }
    Ok(())
}
