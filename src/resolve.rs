//! The two-phase linker.
//!
//! Phase 1 (structural): categories, asset shells, super-asset links (with
//! cycle detection), associations and their fields. Phase 2 (semantic):
//! variables in declaration order, then attack steps — tags/risk/TTC first,
//! then the `requires`/`reaches` step-expression lists through the type
//! checker.
//!
//! The type checker computes the `(source, target)` asset pair of every step
//! expression node:
//!
//! - `union`/`intersection`/`difference` build both sides with the shared
//!   source; the target is the least upper bound of the children's targets.
//! - `collect` builds the rhs with the lhs's target as its source.
//! - `transitive` requires the inner expression's source and target to be
//!   equal.
//! - `subType` restricts the inner target to a named subtype.
//! - `field`/`attackStep`/`variable` resolve against the source asset,
//!   locally or along the super-asset chain.

use crate::builder::{LangBuilder, StepExpressionBuilder, StepsBuilder, VariableBuilder};
use crate::error::LangError;
use crate::lang::{
    AssetData, AssetId, AssociationData, AssociationId, AttackStepData, CategoryData, CategoryId,
    FieldData, FieldId, Lang, Steps, VariableData,
};
use crate::primitives::{check_identifier, AttackStepType, Meta};
use crate::step::{StepExpression, StepKind};
use std::collections::{HashMap, HashSet};

pub(crate) fn build(builder: LangBuilder) -> Result<Lang, LangError> {
    let defines = Meta::from_entries(builder.defines, "define")?;
    if !defines.contains_key("id") {
        return Err(LangError::MissingDefine("id"));
    }
    if !defines.contains_key("version") {
        return Err(LangError::MissingDefine("version"));
    }

    // ─── Phase 1: categories ────────────────────────────────────────────

    let mut categories: Vec<CategoryData> = Vec::with_capacity(builder.categories.len());
    let mut category_ids: HashMap<String, CategoryId> = HashMap::new();
    for category in builder.categories {
        check_identifier(&category.name)?;
        if category_ids.contains_key(&category.name) {
            return Err(LangError::DuplicateName {
                kind: "category",
                name: category.name,
            });
        }
        let meta = category.meta.build("meta key")?;
        category_ids.insert(category.name.clone(), CategoryId(categories.len()));
        categories.push(CategoryData {
            name: category.name,
            meta,
            assets: Vec::new(),
        });
    }

    // ─── Phase 1: asset shells ──────────────────────────────────────────

    struct PendingAsset {
        super_asset: Option<String>,
        variables: Vec<VariableBuilder>,
        attack_steps: Vec<PendingStep>,
    }

    struct PendingStep {
        requires: Option<StepsBuilder>,
        reaches: Option<StepsBuilder>,
    }

    let mut assets: Vec<AssetData> = Vec::with_capacity(builder.assets.len());
    let mut asset_ids: HashMap<String, AssetId> = HashMap::new();
    let mut pending: Vec<PendingAsset> = Vec::with_capacity(builder.assets.len());
    for asset in builder.assets {
        check_identifier(&asset.name)?;
        if asset_ids.contains_key(&asset.name) {
            return Err(LangError::DuplicateName {
                kind: "asset",
                name: asset.name,
            });
        }
        let category =
            *category_ids
                .get(&asset.category)
                .ok_or_else(|| LangError::UnknownReference {
                    kind: "category",
                    name: asset.category.clone(),
                })?;
        let meta = asset.meta.build("meta key")?;
        let id = AssetId(assets.len());
        asset_ids.insert(asset.name.clone(), id);
        categories[category.0].assets.push(id);
        assets.push(AssetData {
            name: asset.name,
            meta,
            category,
            is_abstract: asset.is_abstract,
            super_asset: None,
            variables: Vec::new(),
            attack_steps: Vec::new(),
            fields: Vec::new(),
            svg_icon: asset.svg_icon,
            png_icon: asset.png_icon,
        });
        pending.push(PendingAsset {
            super_asset: asset.super_asset,
            variables: asset.variables,
            attack_steps: Vec::new(),
        });

        // Attack step shells: everything except the expression lists, which
        // phase 2 types once all assets and fields exist.
        let index = assets.len() - 1;
        for step in asset.attack_steps {
            check_identifier(&step.name)?;
            if assets[index]
                .attack_steps
                .iter()
                .any(|s| s.name == step.name)
            {
                return Err(LangError::DuplicateName {
                    kind: "attack step",
                    name: step.name,
                });
            }
            for (i, tag) in step.tags.iter().enumerate() {
                check_identifier(tag)?;
                if step.tags[..i].contains(tag) {
                    return Err(LangError::DuplicateName {
                        kind: "tag",
                        name: tag.clone(),
                    });
                }
            }
            if let Some(ttc) = &step.ttc {
                ttc.check()?;
            }
            let meta = step.meta.build("meta key")?;
            assets[index].attack_steps.push(AttackStepData {
                name: step.name,
                meta,
                kind: step.kind,
                tags: step.tags,
                risk: step.risk,
                ttc: step.ttc,
                requires: None,
                reaches: None,
            });
            pending[index].attack_steps.push(PendingStep {
                requires: step.requires,
                reaches: step.reaches,
            });
        }
    }

    // ─── Phase 1: super-asset links ─────────────────────────────────────

    for (index, p) in pending.iter().enumerate() {
        if let Some(name) = &p.super_asset {
            let sup = *asset_ids.get(name).ok_or_else(|| LangError::UnknownReference {
                kind: "asset",
                name: name.clone(),
            })?;
            assets[index].super_asset = Some(sup);
        }
    }

    for start in 0..assets.len() {
        let mut path = vec![start];
        let mut current = assets[start].super_asset;
        while let Some(AssetId(next)) = current {
            if let Some(pos) = path.iter().position(|&i| i == next) {
                let mut names: Vec<String> = path[pos..]
                    .iter()
                    .map(|&i| assets[i].name.clone())
                    .collect();
                names.push(assets[next].name.clone());
                return Err(LangError::SuperAssetCycle { path: names });
            }
            path.push(next);
            current = assets[next].super_asset;
        }
    }

    // ─── Phase 1: associations and fields ───────────────────────────────

    let mut fields: Vec<FieldData> = Vec::new();
    let mut associations: Vec<AssociationData> = Vec::with_capacity(builder.associations.len());
    let mut association_keys: HashSet<(String, AssetId, AssetId)> = HashSet::new();
    for association in builder.associations {
        check_identifier(&association.name)?;
        check_identifier(&association.left_field)?;
        check_identifier(&association.right_field)?;
        let left_asset = *asset_ids.get(&association.left_asset).ok_or_else(|| {
            LangError::UnknownReference {
                kind: "asset",
                name: association.left_asset.clone(),
            }
        })?;
        let right_asset = *asset_ids.get(&association.right_asset).ok_or_else(|| {
            LangError::UnknownReference {
                kind: "asset",
                name: association.right_asset.clone(),
            }
        })?;
        if !association_keys.insert((association.name.clone(), left_asset, right_asset)) {
            return Err(LangError::DuplicateName {
                kind: "association",
                name: association.name,
            });
        }
        let meta = association.meta.build("meta key")?;
        let association_id = AssociationId(associations.len());
        let left_id = FieldId(fields.len());
        let right_id = FieldId(fields.len() + 1);
        fields.push(FieldData {
            name: association.left_field,
            asset: left_asset,
            multiplicity: association.left_multiplicity,
            association: association_id,
            target: right_id,
        });
        fields.push(FieldData {
            name: association.right_field,
            asset: right_asset,
            multiplicity: association.right_multiplicity,
            association: association_id,
            target: left_id,
        });
        assets[left_asset.0].fields.push(left_id);
        assets[right_asset.0].fields.push(right_id);
        associations.push(AssociationData {
            name: association.name,
            meta,
            left_field: left_id,
            right_field: right_id,
        });
    }

    // Field names are unique per asset across local and inherited fields.
    for asset in &assets {
        for (position, &field_id) in asset.fields.iter().enumerate() {
            let name = &fields[field_id.0].name;
            let local_duplicate = asset.fields[..position]
                .iter()
                .any(|&other| fields[other.0].name == *name);
            if local_duplicate || shadows_inherited_field(&assets, &fields, asset, name) {
                return Err(LangError::DuplicateName {
                    kind: "field",
                    name: name.clone(),
                });
            }
        }
    }

    log::debug!(
        "structural link complete: {} categories, {} assets, {} associations",
        categories.len(),
        assets.len(),
        associations.len()
    );

    // ─── Phase 2: variables ─────────────────────────────────────────────

    let declared_variables: Vec<Vec<String>> = pending
        .iter()
        .map(|p| p.variables.iter().map(|v| v.name.clone()).collect())
        .collect();
    for names in &declared_variables {
        for (i, name) in names.iter().enumerate() {
            check_identifier(name)?;
            if names[..i].contains(name) {
                return Err(LangError::DuplicateName {
                    kind: "variable",
                    name: name.clone(),
                });
            }
        }
    }

    let mut variable_targets: HashMap<(usize, String), AssetId> = HashMap::new();
    for index in 0..assets.len() {
        let variables = std::mem::take(&mut pending[index].variables);
        for variable in variables {
            let expression = {
                let cx = TypeCx {
                    assets: &assets,
                    fields: &fields,
                    asset_ids: &asset_ids,
                    declared_variables: &declared_variables,
                    variable_targets: &variable_targets,
                };
                cx.check_expr(AssetId(index), &variable.expression, false)?
            };
            variable_targets.insert((index, variable.name.clone()), expression.target_asset_id());
            assets[index].variables.push(VariableData {
                name: variable.name,
                expression,
            });
        }
    }

    // ─── Phase 2: attack steps ──────────────────────────────────────────

    let mut resolved: Vec<(usize, usize, Option<Steps>, Option<Steps>)> = Vec::new();
    for index in 0..assets.len() {
        for step_index in 0..assets[index].attack_steps.len() {
            let step = &assets[index].attack_steps[step_index];
            let step_name = step.name.clone();
            let kind = step.kind;

            if let Some(expected) = super_step_kind(&assets, index, &step_name) {
                if expected != kind {
                    return Err(LangError::StepTypeMismatch {
                        asset: assets[index].name.clone(),
                        name: step_name,
                        expected,
                        actual: kind,
                    });
                }
            }

            let slots = &mut pending[index].attack_steps[step_index];
            if slots.requires.is_some() && !kind.is_existence() {
                return Err(LangError::RequiresOnNonExistenceStep {
                    asset: assets[index].name.clone(),
                    name: step_name,
                    kind,
                });
            }
            let requires_builder = slots.requires.take();
            let reaches_builder = slots.reaches.take();

            let cx = TypeCx {
                assets: &assets,
                fields: &fields,
                asset_ids: &asset_ids,
                declared_variables: &declared_variables,
                variable_targets: &variable_targets,
            };
            let requires = match requires_builder {
                None => None,
                Some(steps) => Some(cx.check_steps(AssetId(index), steps)?),
            };
            let reaches = match reaches_builder {
                None => None,
                Some(steps) => {
                    let checked = cx.check_steps(AssetId(index), steps)?;
                    for expression in &checked.expressions {
                        if !terminal_is_attack_step(expression) {
                            return Err(LangError::ReachesNotAttackStep {
                                asset: assets[index].name.clone(),
                                attack_step: step_name.clone(),
                            });
                        }
                    }
                    Some(checked)
                }
            };
            resolved.push((index, step_index, requires, reaches));
        }
    }
    for (index, step_index, requires, reaches) in resolved {
        let step = &mut assets[index].attack_steps[step_index];
        step.requires = requires;
        step.reaches = reaches;
    }

    log::debug!("semantic link complete: language \"{}\"", defines.get("id").unwrap_or(""));

    Ok(Lang {
        defines,
        categories,
        assets,
        fields,
        associations,
        license: builder.license,
        notice: builder.notice,
    })
}

fn shadows_inherited_field(
    assets: &[AssetData],
    fields: &[FieldData],
    asset: &AssetData,
    name: &str,
) -> bool {
    let mut current = asset.super_asset;
    while let Some(AssetId(index)) = current {
        if assets[index]
            .fields
            .iter()
            .any(|&field_id| fields[field_id.0].name == name)
        {
            return true;
        }
        current = assets[index].super_asset;
    }
    false
}

fn super_step_kind(assets: &[AssetData], asset: usize, name: &str) -> Option<AttackStepType> {
    let mut current = assets[asset].super_asset;
    while let Some(AssetId(index)) = current {
        if let Some(step) = assets[index].attack_steps.iter().find(|s| s.name == name) {
            return Some(step.kind);
        }
        current = assets[index].super_asset;
    }
    None
}

fn terminal_is_attack_step(expression: &StepExpression) -> bool {
    match expression.kind() {
        StepKind::AttackStep(_) => true,
        StepKind::Collect(_, rhs) => terminal_is_attack_step(rhs),
        _ => false,
    }
}

// ─── Type checker ───────────────────────────────────────────────────────────

struct TypeCx<'a> {
    assets: &'a [AssetData],
    fields: &'a [FieldData],
    asset_ids: &'a HashMap<String, AssetId>,
    declared_variables: &'a [Vec<String>],
    variable_targets: &'a HashMap<(usize, String), AssetId>,
}

impl TypeCx<'_> {
    fn asset_name(&self, id: AssetId) -> String {
        self.assets[id.0].name.clone()
    }

    /// Whether `asset` equals `ancestor` or has it in its super chain.
    fn is_subtype(&self, asset: AssetId, ancestor: AssetId) -> bool {
        let mut current = Some(asset);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.assets[id.0].super_asset;
        }
        false
    }

    /// The most specific common super asset of `a` and `b`: the first asset
    /// along `a`'s super chain that `b` is a subtype of.
    fn least_upper_bound(&self, a: AssetId, b: AssetId) -> Option<AssetId> {
        let mut current = Some(a);
        while let Some(id) = current {
            if self.is_subtype(b, id) {
                return Some(id);
            }
            current = self.assets[id.0].super_asset;
        }
        None
    }

    fn find_field(&self, source: AssetId, name: &str) -> Option<FieldId> {
        let mut current = Some(source);
        while let Some(id) = current {
            if let Some(&field_id) = self.assets[id.0]
                .fields
                .iter()
                .find(|&&field_id| self.fields[field_id.0].name == name)
            {
                return Some(field_id);
            }
            current = self.assets[id.0].super_asset;
        }
        None
    }

    fn has_attack_step(&self, source: AssetId, name: &str) -> bool {
        let mut current = Some(source);
        while let Some(id) = current {
            if self.assets[id.0].attack_steps.iter().any(|s| s.name == name) {
                return true;
            }
            current = self.assets[id.0].super_asset;
        }
        false
    }

    /// Resolves a variable name to the asset declaring it, local first, then
    /// along the super chain.
    fn find_variable_owner(&self, source: AssetId, name: &str) -> Option<AssetId> {
        let mut current = Some(source);
        while let Some(id) = current {
            if self.declared_variables[id.0].iter().any(|v| v == name) {
                return Some(id);
            }
            current = self.assets[id.0].super_asset;
        }
        None
    }

    fn check_steps(&self, source: AssetId, steps: StepsBuilder) -> Result<Steps, LangError> {
        let mut expressions = Vec::with_capacity(steps.expressions.len());
        for expression in &steps.expressions {
            expressions.push(self.check_expr(source, expression, true)?);
        }
        Ok(Steps {
            overrides: steps.overrides,
            expressions,
        })
    }

    /// Types one expression node. `tail` is true only in tail position of a
    /// top-level `requires`/`reaches` expression, the single place an
    /// `attackStep(…)` reference is permitted.
    fn check_expr(
        &self,
        source: AssetId,
        expression: &StepExpressionBuilder,
        tail: bool,
    ) -> Result<StepExpression, LangError> {
        match expression {
            StepExpressionBuilder::Union(lhs, rhs)
            | StepExpressionBuilder::Intersection(lhs, rhs)
            | StepExpressionBuilder::Difference(lhs, rhs) => {
                let lhs = self.check_expr(source, lhs, false)?;
                let rhs = self.check_expr(source, rhs, false)?;
                let target = self
                    .least_upper_bound(lhs.target_asset_id(), rhs.target_asset_id())
                    .ok_or_else(|| LangError::NoCommonSuperAsset {
                        lhs: self.asset_name(lhs.target_asset_id()),
                        rhs: self.asset_name(rhs.target_asset_id()),
                    })?;
                let kind = match expression {
                    StepExpressionBuilder::Union(..) => {
                        StepKind::Union(Box::new(lhs), Box::new(rhs))
                    }
                    StepExpressionBuilder::Intersection(..) => {
                        StepKind::Intersection(Box::new(lhs), Box::new(rhs))
                    }
                    _ => StepKind::Difference(Box::new(lhs), Box::new(rhs)),
                };
                Ok(StepExpression::new(source, target, kind))
            }
            StepExpressionBuilder::Collect(lhs, rhs) => {
                let lhs = self.check_expr(source, lhs, false)?;
                let rhs = self.check_expr(lhs.target_asset_id(), rhs, tail)?;
                let target = rhs.target_asset_id();
                Ok(StepExpression::new(
                    source,
                    target,
                    StepKind::Collect(Box::new(lhs), Box::new(rhs)),
                ))
            }
            StepExpressionBuilder::Transitive(inner) => {
                let inner = self.check_expr(source, inner, false)?;
                if inner.source_asset_id() != inner.target_asset_id() {
                    return Err(LangError::TransitiveNonUniform {
                        asset: self.asset_name(source),
                        src: self.asset_name(inner.source_asset_id()),
                        target: self.asset_name(inner.target_asset_id()),
                    });
                }
                Ok(StepExpression::new(
                    inner.source_asset_id(),
                    inner.target_asset_id(),
                    StepKind::Transitive(Box::new(inner)),
                ))
            }
            StepExpressionBuilder::SubType(name, inner) => {
                let inner = self.check_expr(source, inner, false)?;
                let sub = *self
                    .asset_ids
                    .get(name)
                    .ok_or_else(|| LangError::UnknownReference {
                        kind: "asset",
                        name: name.clone(),
                    })?;
                if !self.is_subtype(sub, inner.target_asset_id()) {
                    return Err(LangError::IncompatibleSubType {
                        sub: name.clone(),
                        sup: self.asset_name(inner.target_asset_id()),
                    });
                }
                Ok(StepExpression::new(
                    source,
                    sub,
                    StepKind::SubType(name.clone(), Box::new(inner)),
                ))
            }
            StepExpressionBuilder::Field(name) => {
                let field_id =
                    self.find_field(source, name)
                        .ok_or_else(|| LangError::UnknownReference {
                            kind: "field",
                            name: name.clone(),
                        })?;
                let target = self.fields[self.fields[field_id.0].target.0].asset;
                Ok(StepExpression::new(
                    source,
                    target,
                    StepKind::Field(name.clone()),
                ))
            }
            StepExpressionBuilder::AttackStep(name) => {
                if !tail {
                    return Err(LangError::MisplacedAttackStep {
                        asset: self.asset_name(source),
                        name: name.clone(),
                    });
                }
                if !self.has_attack_step(source, name) {
                    return Err(LangError::UnknownReference {
                        kind: "attack step",
                        name: name.clone(),
                    });
                }
                Ok(StepExpression::new(
                    source,
                    source,
                    StepKind::AttackStep(name.clone()),
                ))
            }
            StepExpressionBuilder::Variable(name) => {
                let owner = self.find_variable_owner(source, name).ok_or_else(|| {
                    LangError::UnknownReference {
                        kind: "variable",
                        name: name.clone(),
                    }
                })?;
                let target = self
                    .variable_targets
                    .get(&(owner.0, name.clone()))
                    .copied()
                    .ok_or_else(|| LangError::VariableCycle {
                        asset: self.asset_name(source),
                        variable: name.clone(),
                    })?;
                Ok(StepExpression::new(
                    source,
                    target,
                    StepKind::Variable(name.clone()),
                ))
            }
        }
    }
}
