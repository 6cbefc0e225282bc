//! The immutable language model.
//!
//! A [`Lang`] owns every category, asset, field, association, variable, and
//! attack step in arena vectors; entities refer to each other through stable
//! indices. The borrowing wrapper types ([`Asset`], [`AttackStep`], …) expose
//! the object graph, including inherited lookups along the super-asset chain.
//!
//! A `Lang` is only produced by [`LangBuilder::build`](crate::builder::LangBuilder::build)
//! and never mutates afterwards; sharing it across threads is safe.

use crate::primitives::{AttackStepType, Meta, Multiplicity, Risk};
use crate::step::StepExpression;
use crate::ttc::TtcExpression;

/// The `formatVersion` constant of the `langspec.json` document.
pub const FORMAT_VERSION: &str = "1.0.0";

// ─── Arena indices ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CategoryId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssetId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssociationId(pub(crate) usize);

// ─── Arena data ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CategoryData {
    pub(crate) name: String,
    pub(crate) meta: Meta,
    pub(crate) assets: Vec<AssetId>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AssetData {
    pub(crate) name: String,
    pub(crate) meta: Meta,
    pub(crate) category: CategoryId,
    pub(crate) is_abstract: bool,
    pub(crate) super_asset: Option<AssetId>,
    pub(crate) variables: Vec<VariableData>,
    pub(crate) attack_steps: Vec<AttackStepData>,
    pub(crate) fields: Vec<FieldId>,
    pub(crate) svg_icon: Option<Vec<u8>>,
    pub(crate) png_icon: Option<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VariableData {
    pub(crate) name: String,
    pub(crate) expression: StepExpression,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AttackStepData {
    pub(crate) name: String,
    pub(crate) meta: Meta,
    pub(crate) kind: AttackStepType,
    pub(crate) tags: Vec<String>,
    pub(crate) risk: Option<Risk>,
    pub(crate) ttc: Option<TtcExpression>,
    pub(crate) requires: Option<Steps>,
    pub(crate) reaches: Option<Steps>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FieldData {
    pub(crate) name: String,
    pub(crate) asset: AssetId,
    pub(crate) multiplicity: Multiplicity,
    pub(crate) association: AssociationId,
    pub(crate) target: FieldId,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AssociationData {
    pub(crate) name: String,
    pub(crate) meta: Meta,
    pub(crate) left_field: FieldId,
    pub(crate) right_field: FieldId,
}

/// An ordered list of step expressions in a `requires` or `reaches` slot,
/// together with the flag deciding whether it replaces or extends the
/// inherited list.
#[derive(Clone, Debug, PartialEq)]
pub struct Steps {
    pub(crate) overrides: bool,
    pub(crate) expressions: Vec<StepExpression>,
}

impl Steps {
    /// Whether this list replaces (`true`) or extends (`false`) the list
    /// inherited from the super attack step.
    pub fn overrides(&self) -> bool {
        self.overrides
    }

    pub fn expressions(&self) -> &[StepExpression] {
        &self.expressions
    }
}

// ─── Lang ───────────────────────────────────────────────────────────────────

/// A fully linked threat-modeling language descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Lang {
    pub(crate) defines: Meta,
    pub(crate) categories: Vec<CategoryData>,
    pub(crate) assets: Vec<AssetData>,
    pub(crate) fields: Vec<FieldData>,
    pub(crate) associations: Vec<AssociationData>,
    pub(crate) license: Option<String>,
    pub(crate) notice: Option<String>,
}

impl Lang {
    /// The `formatVersion` this library reads and writes.
    pub fn format_version(&self) -> &'static str {
        FORMAT_VERSION
    }

    /// The defines map; always contains `id` and `version`.
    pub fn defines(&self) -> &Meta {
        &self.defines
    }

    pub fn categories(&self) -> impl ExactSizeIterator<Item = Category<'_>> {
        (0..self.categories.len()).map(move |i| Category {
            lang: self,
            id: CategoryId(i),
        })
    }

    pub fn category(&self, name: &str) -> Option<Category<'_>> {
        self.categories().find(|c| c.name() == name)
    }

    pub fn assets(&self) -> impl ExactSizeIterator<Item = Asset<'_>> {
        (0..self.assets.len()).map(move |i| Asset {
            lang: self,
            id: AssetId(i),
        })
    }

    pub fn asset(&self, name: &str) -> Option<Asset<'_>> {
        self.assets().find(|a| a.name() == name)
    }

    pub fn associations(&self) -> impl ExactSizeIterator<Item = Association<'_>> {
        (0..self.associations.len()).map(move |i| Association {
            lang: self,
            id: AssociationId(i),
        })
    }

    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn asset_by_id(&self, id: AssetId) -> Asset<'_> {
        Asset { lang: self, id }
    }
}

// ─── Category ───────────────────────────────────────────────────────────────

/// A category grouping assets.
#[derive(Clone, Copy, Debug)]
pub struct Category<'a> {
    lang: &'a Lang,
    id: CategoryId,
}

impl<'a> Category<'a> {
    fn data(&self) -> &'a CategoryData {
        &self.lang.categories[self.id.0]
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn meta(&self) -> &'a Meta {
        &self.data().meta
    }

    /// The assets of this category, in declaration order.
    pub fn assets(&self) -> impl ExactSizeIterator<Item = Asset<'a>> {
        let lang = self.lang;
        self.data().assets.iter().map(move |&id| Asset { lang, id })
    }
}

impl PartialEq for Category<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.lang, other.lang) && self.id == other.id
    }
}

// ─── Asset ──────────────────────────────────────────────────────────────────

/// An asset type, with inherited lookup along its super-asset chain.
#[derive(Clone, Copy, Debug)]
pub struct Asset<'a> {
    lang: &'a Lang,
    id: AssetId,
}

impl<'a> Asset<'a> {
    fn data(&self) -> &'a AssetData {
        &self.lang.assets[self.id.0]
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn meta(&self) -> &'a Meta {
        &self.data().meta
    }

    pub fn category(&self) -> Category<'a> {
        Category {
            lang: self.lang,
            id: self.data().category,
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.data().is_abstract
    }

    pub fn super_asset(&self) -> Option<Asset<'a>> {
        self.data().super_asset.map(|id| Asset {
            lang: self.lang,
            id,
        })
    }

    /// Whether this asset equals `other` or has it in its super-asset chain.
    pub fn is_subtype_of(&self, other: &Asset<'_>) -> bool {
        let mut current = Some(*self);
        while let Some(asset) = current {
            if asset.id == other.id {
                return true;
            }
            current = asset.super_asset();
        }
        false
    }

    // ─── Variables ──────────────────────────────────────────────────────

    pub fn local_variables(&self) -> impl ExactSizeIterator<Item = Variable<'a>> {
        let (lang, id) = (self.lang, self.id);
        (0..self.data().variables.len()).map(move |i| Variable {
            lang,
            asset: id,
            index: i,
        })
    }

    /// All variables, inherited first (minus those shadowed locally), then
    /// local ones, each group in declaration order.
    pub fn variables(&self) -> Vec<Variable<'a>> {
        let locals = &self.data().variables;
        let mut result: Vec<Variable<'a>> = match self.super_asset() {
            Some(sup) => sup
                .variables()
                .into_iter()
                .filter(|v| locals.iter().all(|l| l.name != v.name()))
                .collect(),
            None => Vec::new(),
        };
        result.extend(self.local_variables());
        result
    }

    /// Looks up a variable locally, then along the super-asset chain.
    pub fn variable(&self, name: &str) -> Option<Variable<'a>> {
        if let Some(index) = self.data().variables.iter().position(|v| v.name == name) {
            return Some(Variable {
                lang: self.lang,
                asset: self.id,
                index,
            });
        }
        self.super_asset().and_then(|sup| sup.variable(name))
    }

    // ─── Attack steps ───────────────────────────────────────────────────

    pub fn local_attack_steps(&self) -> impl ExactSizeIterator<Item = AttackStep<'a>> {
        let (lang, id) = (self.lang, self.id);
        (0..self.data().attack_steps.len()).map(move |i| AttackStep {
            lang,
            asset: id,
            index: i,
        })
    }

    /// All attack steps, inherited first (minus those overridden locally),
    /// then local ones, each group in declaration order.
    pub fn attack_steps(&self) -> Vec<AttackStep<'a>> {
        let locals = &self.data().attack_steps;
        let mut result: Vec<AttackStep<'a>> = match self.super_asset() {
            Some(sup) => sup
                .attack_steps()
                .into_iter()
                .filter(|s| locals.iter().all(|l| l.name != s.name()))
                .collect(),
            None => Vec::new(),
        };
        result.extend(self.local_attack_steps());
        result
    }

    /// Looks up an attack step locally, then along the super-asset chain.
    pub fn attack_step(&self, name: &str) -> Option<AttackStep<'a>> {
        if let Some(index) = self
            .data()
            .attack_steps
            .iter()
            .position(|s| s.name == name)
        {
            return Some(AttackStep {
                lang: self.lang,
                asset: self.id,
                index,
            });
        }
        self.super_asset().and_then(|sup| sup.attack_step(name))
    }

    // ─── Fields ─────────────────────────────────────────────────────────

    pub fn local_fields(&self) -> impl ExactSizeIterator<Item = Field<'a>> {
        let lang = self.lang;
        self.data().fields.iter().map(move |&id| Field { lang, id })
    }

    /// All fields, inherited first, then local ones. Field names never
    /// shadow, so the union is disjoint.
    pub fn fields(&self) -> Vec<Field<'a>> {
        let mut result = match self.super_asset() {
            Some(sup) => sup.fields(),
            None => Vec::new(),
        };
        result.extend(self.local_fields());
        result
    }

    /// Looks up a field locally, then along the super-asset chain.
    pub fn field(&self, name: &str) -> Option<Field<'a>> {
        let lang = self.lang;
        self.data()
            .fields
            .iter()
            .copied()
            .map(|id| Field { lang, id })
            .find(|f| f.name() == name)
            .or_else(|| self.super_asset().and_then(|sup| sup.field(name)))
    }

    // ─── Icons ──────────────────────────────────────────────────────────

    pub fn local_svg_icon(&self) -> Option<&'a [u8]> {
        self.data().svg_icon.as_deref()
    }

    /// The SVG icon: local if present, else inherited.
    pub fn svg_icon(&self) -> Option<&'a [u8]> {
        self.local_svg_icon()
            .or_else(|| self.super_asset().and_then(|sup| sup.svg_icon()))
    }

    pub fn local_png_icon(&self) -> Option<&'a [u8]> {
        self.data().png_icon.as_deref()
    }

    /// The PNG icon: local if present, else inherited.
    pub fn png_icon(&self) -> Option<&'a [u8]> {
        self.local_png_icon()
            .or_else(|| self.super_asset().and_then(|sup| sup.png_icon()))
    }
}

impl PartialEq for Asset<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.lang, other.lang) && self.id == other.id
    }
}

// ─── Variable ───────────────────────────────────────────────────────────────

/// A named step expression on an asset.
#[derive(Clone, Copy, Debug)]
pub struct Variable<'a> {
    lang: &'a Lang,
    asset: AssetId,
    index: usize,
}

impl<'a> Variable<'a> {
    fn data(&self) -> &'a VariableData {
        &self.lang.assets[self.asset.0].variables[self.index]
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    /// The asset this variable is declared on.
    pub fn asset(&self) -> Asset<'a> {
        Asset {
            lang: self.lang,
            id: self.asset,
        }
    }

    pub fn step_expression(&self) -> &'a StepExpression {
        &self.data().expression
    }

    /// The target asset of this variable's expression.
    pub fn target_asset(&self) -> Asset<'a> {
        self.data().expression.target_asset(self.lang)
    }
}

impl PartialEq for Variable<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.lang, other.lang)
            && self.asset == other.asset
            && self.index == other.index
    }
}

// ─── AttackStep ─────────────────────────────────────────────────────────────

/// An attack step or defense on an asset.
///
/// Tags, risk, and TTC inherit from the super attack step when not set
/// locally; `requires` and `reaches` either extend or replace the inherited
/// lists depending on their `overrides` flag.
#[derive(Clone, Copy, Debug)]
pub struct AttackStep<'a> {
    lang: &'a Lang,
    asset: AssetId,
    index: usize,
}

impl<'a> AttackStep<'a> {
    fn data(&self) -> &'a AttackStepData {
        &self.lang.assets[self.asset.0].attack_steps[self.index]
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn meta(&self) -> &'a Meta {
        &self.data().meta
    }

    /// The asset this attack step is declared on.
    pub fn asset(&self) -> Asset<'a> {
        Asset {
            lang: self.lang,
            id: self.asset,
        }
    }

    pub fn kind(&self) -> AttackStepType {
        self.data().kind
    }

    /// The attack step this one overrides, if any super asset declares a step
    /// with the same name.
    pub fn super_attack_step(&self) -> Option<AttackStep<'a>> {
        self.asset()
            .super_asset()
            .and_then(|sup| sup.attack_step(self.name()))
    }

    pub fn local_tags(&self) -> &'a [String] {
        &self.data().tags
    }

    /// All tags: inherited first, then local ones not already present.
    pub fn tags(&self) -> Vec<&'a str> {
        let mut tags: Vec<&'a str> = self
            .super_attack_step()
            .map(|sup| sup.tags())
            .unwrap_or_default();
        for tag in self.local_tags() {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag);
            }
        }
        tags
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags().contains(&name)
    }

    pub fn local_risk(&self) -> Option<Risk> {
        self.data().risk
    }

    /// The risk: local if set, else inherited.
    pub fn risk(&self) -> Option<Risk> {
        self.local_risk()
            .or_else(|| self.super_attack_step().and_then(|sup| sup.risk()))
    }

    pub fn local_ttc(&self) -> Option<&'a TtcExpression> {
        self.data().ttc.as_ref()
    }

    /// The TTC: local if set, else inherited.
    pub fn ttc(&self) -> Option<&'a TtcExpression> {
        self.local_ttc()
            .or_else(|| self.super_attack_step().and_then(|sup| sup.ttc()))
    }

    pub fn local_requires(&self) -> Option<&'a Steps> {
        self.data().requires.as_ref()
    }

    pub fn local_reaches(&self) -> Option<&'a Steps> {
        self.data().reaches.as_ref()
    }

    /// The effective `requires` list after applying override/extend semantics
    /// along the super chain.
    pub fn requires(&self) -> Vec<&'a StepExpression> {
        let inherited = self
            .super_attack_step()
            .map(|sup| sup.requires())
            .unwrap_or_default();
        effective_steps(self.local_requires(), inherited)
    }

    /// The effective `reaches` list after applying override/extend semantics
    /// along the super chain. Every expression ends in an attack step
    /// reference.
    pub fn reaches(&self) -> Vec<&'a StepExpression> {
        let inherited = self
            .super_attack_step()
            .map(|sup| sup.reaches())
            .unwrap_or_default();
        effective_steps(self.local_reaches(), inherited)
    }
}

fn effective_steps<'a>(
    local: Option<&'a Steps>,
    inherited: Vec<&'a StepExpression>,
) -> Vec<&'a StepExpression> {
    match local {
        None => inherited,
        Some(steps) if steps.overrides => steps.expressions.iter().collect(),
        Some(steps) => {
            let mut result = inherited;
            result.extend(steps.expressions.iter());
            result
        }
    }
}

impl PartialEq for AttackStep<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.lang, other.lang)
            && self.asset == other.asset
            && self.index == other.index
    }
}

// ─── Field ──────────────────────────────────────────────────────────────────

/// One named endpoint of an association, owned by an asset.
#[derive(Clone, Copy, Debug)]
pub struct Field<'a> {
    lang: &'a Lang,
    id: FieldId,
}

impl<'a> Field<'a> {
    fn data(&self) -> &'a FieldData {
        &self.lang.fields[self.id.0]
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    /// The asset this field is attached to.
    pub fn asset(&self) -> Asset<'a> {
        Asset {
            lang: self.lang,
            id: self.data().asset,
        }
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.data().multiplicity
    }

    pub fn association(&self) -> Association<'a> {
        Association {
            lang: self.lang,
            id: self.data().association,
        }
    }

    /// The field on the other end of the association. Navigating this field
    /// leads to the target field's asset.
    pub fn target(&self) -> Field<'a> {
        Field {
            lang: self.lang,
            id: self.data().target,
        }
    }
}

impl PartialEq for Field<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.lang, other.lang) && self.id == other.id
    }
}

// ─── Association ────────────────────────────────────────────────────────────

/// A binary relation between two assets with named, multiplicity-bounded
/// endpoints.
#[derive(Clone, Copy, Debug)]
pub struct Association<'a> {
    lang: &'a Lang,
    id: AssociationId,
}

impl<'a> Association<'a> {
    fn data(&self) -> &'a AssociationData {
        &self.lang.associations[self.id.0]
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn meta(&self) -> &'a Meta {
        &self.data().meta
    }

    pub fn left_field(&self) -> Field<'a> {
        Field {
            lang: self.lang,
            id: self.data().left_field,
        }
    }

    pub fn right_field(&self) -> Field<'a> {
        Field {
            lang: self.lang,
            id: self.data().right_field,
        }
    }
}

impl PartialEq for Association<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.lang, other.lang) && self.id == other.id
    }
}
