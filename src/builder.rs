//! The mutable, by-name builder layer.
//!
//! Builders collect flat, declarative descriptions — every cross-reference is
//! a plain name. [`LangBuilder::build`] hands the whole description to the
//! linker, which either produces a fully validated immutable
//! [`Lang`](crate::lang::Lang) or a typed [`LangError`](crate::error::LangError);
//! a failed build exposes no partial graph.
//!
//! The JSON parser produces builders, and programs may construct them
//! directly without any JSON involved.

use crate::error::LangError;
use crate::lang::Lang;
use crate::primitives::{AttackStepType, Meta, Multiplicity, Risk};
use crate::resolve;
use crate::ttc::TtcExpression;

// ─── Meta ───────────────────────────────────────────────────────────────────

/// Builder for ordered meta maps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetaBuilder {
    pub(crate) entries: Vec<(String, String)>,
}

impl MetaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Keys are validated as identifiers and checked for
    /// duplicates at build time.
    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub(crate) fn build(self, kind: &'static str) -> Result<Meta, LangError> {
        Meta::from_entries(self.entries, kind)
    }
}

// ─── Step expressions ───────────────────────────────────────────────────────

/// An unresolved step expression: names only, no typing.
///
/// The linker's type checker turns these into typed
/// [`StepExpression`](crate::step::StepExpression)s with a resolved source and
/// target asset per node.
#[derive(Clone, Debug, PartialEq)]
pub enum StepExpressionBuilder {
    Union(Box<StepExpressionBuilder>, Box<StepExpressionBuilder>),
    Intersection(Box<StepExpressionBuilder>, Box<StepExpressionBuilder>),
    Difference(Box<StepExpressionBuilder>, Box<StepExpressionBuilder>),
    Collect(Box<StepExpressionBuilder>, Box<StepExpressionBuilder>),
    Transitive(Box<StepExpressionBuilder>),
    SubType(String, Box<StepExpressionBuilder>),
    Field(String),
    AttackStep(String),
    Variable(String),
}

impl StepExpressionBuilder {
    pub fn union(lhs: StepExpressionBuilder, rhs: StepExpressionBuilder) -> Self {
        StepExpressionBuilder::Union(Box::new(lhs), Box::new(rhs))
    }

    pub fn intersection(lhs: StepExpressionBuilder, rhs: StepExpressionBuilder) -> Self {
        StepExpressionBuilder::Intersection(Box::new(lhs), Box::new(rhs))
    }

    pub fn difference(lhs: StepExpressionBuilder, rhs: StepExpressionBuilder) -> Self {
        StepExpressionBuilder::Difference(Box::new(lhs), Box::new(rhs))
    }

    pub fn collect(lhs: StepExpressionBuilder, rhs: StepExpressionBuilder) -> Self {
        StepExpressionBuilder::Collect(Box::new(lhs), Box::new(rhs))
    }

    pub fn transitive(inner: StepExpressionBuilder) -> Self {
        StepExpressionBuilder::Transitive(Box::new(inner))
    }

    pub fn sub_type(asset: impl Into<String>, inner: StepExpressionBuilder) -> Self {
        StepExpressionBuilder::SubType(asset.into(), Box::new(inner))
    }

    pub fn field(name: impl Into<String>) -> Self {
        StepExpressionBuilder::Field(name.into())
    }

    pub fn attack_step(name: impl Into<String>) -> Self {
        StepExpressionBuilder::AttackStep(name.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        StepExpressionBuilder::Variable(name.into())
    }
}

/// Builder for a `requires` or `reaches` list.
#[derive(Clone, Debug, PartialEq)]
pub struct StepsBuilder {
    pub(crate) overrides: bool,
    pub(crate) expressions: Vec<StepExpressionBuilder>,
}

impl StepsBuilder {
    /// A list that extends the one inherited from the super attack step.
    pub fn extending() -> Self {
        StepsBuilder {
            overrides: false,
            expressions: Vec::new(),
        }
    }

    /// A list that replaces the one inherited from the super attack step.
    pub fn overriding() -> Self {
        StepsBuilder {
            overrides: true,
            expressions: Vec::new(),
        }
    }

    pub fn expression(mut self, expression: StepExpressionBuilder) -> Self {
        self.expressions.push(expression);
        self
    }
}

// ─── Variables and attack steps ─────────────────────────────────────────────

/// Builder for a variable: a named step expression on an asset.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableBuilder {
    pub(crate) name: String,
    pub(crate) expression: StepExpressionBuilder,
}

impl VariableBuilder {
    pub fn new(name: impl Into<String>, expression: StepExpressionBuilder) -> Self {
        VariableBuilder {
            name: name.into(),
            expression,
        }
    }
}

/// Builder for an attack step.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackStepBuilder {
    pub(crate) name: String,
    pub(crate) meta: MetaBuilder,
    pub(crate) kind: AttackStepType,
    pub(crate) tags: Vec<String>,
    pub(crate) risk: Option<Risk>,
    pub(crate) ttc: Option<TtcExpression>,
    pub(crate) requires: Option<StepsBuilder>,
    pub(crate) reaches: Option<StepsBuilder>,
}

impl AttackStepBuilder {
    pub fn new(name: impl Into<String>, kind: AttackStepType) -> Self {
        AttackStepBuilder {
            name: name.into(),
            meta: MetaBuilder::new(),
            kind,
            tags: Vec::new(),
            risk: None,
            ttc: None,
            requires: None,
            reaches: None,
        }
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta = self.meta.entry(key, value);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn risk(mut self, risk: Risk) -> Self {
        self.risk = Some(risk);
        self
    }

    /// Sets the local TTC. Absence means "inherit"; pass
    /// [`TtcExpression::Empty`] for an explicit empty TTC.
    pub fn ttc(mut self, ttc: TtcExpression) -> Self {
        self.ttc = Some(ttc);
        self
    }

    /// Only permitted on exist and not-exist steps.
    pub fn requires(mut self, steps: StepsBuilder) -> Self {
        self.requires = Some(steps);
        self
    }

    pub fn reaches(mut self, steps: StepsBuilder) -> Self {
        self.reaches = Some(steps);
        self
    }
}

// ─── Categories, assets, associations ───────────────────────────────────────

/// Builder for a category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryBuilder {
    pub(crate) name: String,
    pub(crate) meta: MetaBuilder,
}

impl CategoryBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        CategoryBuilder {
            name: name.into(),
            meta: MetaBuilder::new(),
        }
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta = self.meta.entry(key, value);
        self
    }
}

/// Builder for an asset.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetBuilder {
    pub(crate) name: String,
    pub(crate) category: String,
    pub(crate) meta: MetaBuilder,
    pub(crate) is_abstract: bool,
    pub(crate) super_asset: Option<String>,
    pub(crate) variables: Vec<VariableBuilder>,
    pub(crate) attack_steps: Vec<AttackStepBuilder>,
    pub(crate) svg_icon: Option<Vec<u8>>,
    pub(crate) png_icon: Option<Vec<u8>>,
}

impl AssetBuilder {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        AssetBuilder {
            name: name.into(),
            category: category.into(),
            meta: MetaBuilder::new(),
            is_abstract: false,
            super_asset: None,
            variables: Vec::new(),
            attack_steps: Vec::new(),
            svg_icon: None,
            png_icon: None,
        }
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta = self.meta.entry(key, value);
        self
    }

    pub fn is_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn super_asset(mut self, super_asset: impl Into<String>) -> Self {
        self.super_asset = Some(super_asset.into());
        self
    }

    pub fn variable(mut self, variable: VariableBuilder) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn attack_step(mut self, attack_step: AttackStepBuilder) -> Self {
        self.attack_steps.push(attack_step);
        self
    }

    pub fn svg_icon(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.svg_icon = Some(bytes.into());
        self
    }

    pub fn png_icon(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.png_icon = Some(bytes.into());
        self
    }
}

/// Builder for an association between two assets.
///
/// The left field is attached to the left asset and the right field to the
/// right asset; the linker cross-links the two fields as each other's target.
#[derive(Clone, Debug, PartialEq)]
pub struct AssociationBuilder {
    pub(crate) name: String,
    pub(crate) meta: MetaBuilder,
    pub(crate) left_asset: String,
    pub(crate) left_field: String,
    pub(crate) left_multiplicity: Multiplicity,
    pub(crate) right_asset: String,
    pub(crate) right_field: String,
    pub(crate) right_multiplicity: Multiplicity,
}

impl AssociationBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        left_asset: impl Into<String>,
        left_field: impl Into<String>,
        left_multiplicity: Multiplicity,
        right_asset: impl Into<String>,
        right_field: impl Into<String>,
        right_multiplicity: Multiplicity,
    ) -> Self {
        AssociationBuilder {
            name: name.into(),
            meta: MetaBuilder::new(),
            left_asset: left_asset.into(),
            left_field: left_field.into(),
            left_multiplicity,
            right_asset: right_asset.into(),
            right_field: right_field.into(),
            right_multiplicity,
        }
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta = self.meta.entry(key, value);
        self
    }
}

// ─── Lang ───────────────────────────────────────────────────────────────────

/// Builder for a whole language.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LangBuilder {
    pub(crate) defines: Vec<(String, String)>,
    pub(crate) categories: Vec<CategoryBuilder>,
    pub(crate) assets: Vec<AssetBuilder>,
    pub(crate) associations: Vec<AssociationBuilder>,
    pub(crate) license: Option<String>,
    pub(crate) notice: Option<String>,
}

impl LangBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a defines entry. `id` and `version` are mandatory at build time.
    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((key.into(), value.into()));
        self
    }

    pub fn category(mut self, category: CategoryBuilder) -> Self {
        self.categories.push(category);
        self
    }

    pub fn asset(mut self, asset: AssetBuilder) -> Self {
        self.assets.push(asset);
        self
    }

    pub fn association(mut self, association: AssociationBuilder) -> Self {
        self.associations.push(association);
        self
    }

    pub fn license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    pub fn notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    /// Attaches icon bytes to the named asset builder, if present. Used by the
    /// archive reader; unmatched icons are ignored.
    pub(crate) fn attach_svg_icon(&mut self, asset: &str, bytes: Vec<u8>) {
        if let Some(builder) = self.assets.iter_mut().find(|a| a.name == asset) {
            builder.svg_icon = Some(bytes);
        }
    }

    pub(crate) fn attach_png_icon(&mut self, asset: &str, bytes: Vec<u8>) {
        if let Some(builder) = self.assets.iter_mut().find(|a| a.name == asset) {
            builder.png_icon = Some(bytes);
        }
    }

    /// Links the description into an immutable [`Lang`].
    ///
    /// Linking runs in two phases: the structural phase builds categories,
    /// assets, super-asset links, and associations; the semantic phase types
    /// every variable and attack step expression and checks the remaining
    /// invariants.
    ///
    /// # Errors
    ///
    /// Any violated invariant surfaces as the corresponding
    /// [`LangError`](crate::error::LangError) variant; no partial language is
    /// exposed.
    pub fn build(self) -> Result<Lang, LangError> {
        resolve::build(self)
    }
}
