//! Typed step expressions.
//!
//! Every node carries the source and target asset computed by the linker's
//! type checker during [`LangBuilder::build`](crate::builder::LangBuilder::build).

use crate::lang::{Asset, AssetId, AttackStep, Lang};

/// A step expression navigating from a source asset to a target asset.
///
/// Step expressions only exist inside a built [`Lang`]: the linker has already
/// resolved every name and computed the `(source, target)` pair of every node.
#[derive(Clone, Debug, PartialEq)]
pub struct StepExpression {
    pub(crate) source: AssetId,
    pub(crate) target: AssetId,
    pub(crate) kind: StepKind,
}

/// The form of a [`StepExpression`] node.
#[derive(Clone, Debug, PartialEq)]
pub enum StepKind {
    /// Set union of two expressions sharing a source asset.
    Union(Box<StepExpression>, Box<StepExpression>),
    /// Set intersection of two expressions sharing a source asset.
    Intersection(Box<StepExpression>, Box<StepExpression>),
    /// Set difference of two expressions sharing a source asset.
    Difference(Box<StepExpression>, Box<StepExpression>),
    /// Sequential composition: the rhs starts where the lhs ends.
    Collect(Box<StepExpression>, Box<StepExpression>),
    /// Zero-or-more repetitions of an expression with equal source and target.
    Transitive(Box<StepExpression>),
    /// Restriction of the inner expression's target to a subtype.
    SubType(String, Box<StepExpression>),
    /// Navigation along a field of the source asset.
    Field(String),
    /// A reference to an attack step on the source asset. Only occurs in tail
    /// position of a `requires`/`reaches` expression.
    AttackStep(String),
    /// A reference to a variable of the source asset.
    Variable(String),
}

impl StepExpression {
    pub(crate) fn new(source: AssetId, target: AssetId, kind: StepKind) -> Self {
        StepExpression {
            source,
            target,
            kind,
        }
    }

    pub fn source_asset_id(&self) -> AssetId {
        self.source
    }

    pub fn target_asset_id(&self) -> AssetId {
        self.target
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    /// The asset this expression navigates from.
    pub fn source_asset<'a>(&self, lang: &'a Lang) -> Asset<'a> {
        lang.asset_by_id(self.source)
    }

    /// The asset this expression navigates to.
    pub fn target_asset<'a>(&self, lang: &'a Lang) -> Asset<'a> {
        lang.asset_by_id(self.target)
    }

    /// The attack step a `reaches` expression terminates in: the
    /// `attackStep(…)` node at the end of the collect chain, resolved on that
    /// node's source asset.
    ///
    /// Returns `None` for expressions that do not end in an attack step
    /// reference (possible for `requires` elements).
    pub fn terminal_attack_step<'a>(&self, lang: &'a Lang) -> Option<AttackStep<'a>> {
        match &self.kind {
            StepKind::AttackStep(name) => lang.asset_by_id(self.source).attack_step(name),
            StepKind::Collect(_, rhs) => rhs.terminal_attack_step(lang),
            _ => None,
        }
    }
}
