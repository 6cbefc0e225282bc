//! Inherited lookup and override semantics along the super-asset chain.

use super::common::base_builder;
use threatlang::{
    AssetBuilder, AttackStepBuilder, AttackStepType, LangBuilder, LangError, Risk,
    StepExpressionBuilder, StepsBuilder, TtcExpression, VariableBuilder,
};

fn base_derived(derived_step: AttackStepBuilder) -> LangBuilder {
    base_builder()
        .asset(
            AssetBuilder::new("Base", "System").is_abstract(true).attack_step(
                AttackStepBuilder::new("compromise", AttackStepType::Or)
                    .ttc(TtcExpression::function("Exponential", [1.0])),
            ),
        )
        .asset(
            AssetBuilder::new("Derived", "System")
                .super_asset("Base")
                .attack_step(derived_step),
        )
}

#[test]
fn override_without_ttc_inherits_super_ttc() {
    let lang = base_derived(AttackStepBuilder::new("compromise", AttackStepType::Or))
        .build()
        .expect("build should succeed");

    let derived = lang.asset("Derived").expect("asset Derived");
    let step = derived.attack_step("compromise").expect("attack step");
    assert_eq!(step.asset().name(), "Derived");
    assert!(step.local_ttc().is_none());

    let ttc = step.ttc().expect("inherited TTC");
    assert_eq!(ttc, &TtcExpression::function("Exponential", [1.0]));
    assert_eq!(ttc.mean_ttc(), Ok(1.0));
}

#[test]
fn local_ttc_wins_over_inherited() {
    let lang = base_derived(
        AttackStepBuilder::new("compromise", AttackStepType::Or)
            .ttc(TtcExpression::function("Exponential", [0.5])),
    )
    .build()
    .expect("build should succeed");

    let step = lang
        .asset("Derived")
        .expect("asset")
        .attack_step("compromise")
        .expect("attack step");
    assert_eq!(step.ttc().expect("TTC").mean_ttc(), Ok(2.0));
}

#[test]
fn override_type_mismatch_is_rejected() {
    let err = base_derived(AttackStepBuilder::new("compromise", AttackStepType::And))
        .build()
        .expect_err("build should fail");
    assert!(matches!(
        err,
        LangError::StepTypeMismatch {
            expected: AttackStepType::Or,
            actual: AttackStepType::And,
            ..
        }
    ));
}

#[test]
fn attack_steps_order_super_then_local_with_overrides_removed() {
    let lang = base_builder()
        .asset(
            AssetBuilder::new("Base", "System")
                .attack_step(AttackStepBuilder::new("first", AttackStepType::Or))
                .attack_step(AttackStepBuilder::new("second", AttackStepType::And)),
        )
        .asset(
            AssetBuilder::new("Derived", "System")
                .super_asset("Base")
                .attack_step(AttackStepBuilder::new("second", AttackStepType::And))
                .attack_step(AttackStepBuilder::new("third", AttackStepType::Or)),
        )
        .build()
        .expect("build should succeed");

    let derived = lang.asset("Derived").expect("asset");
    let names: Vec<&str> = derived.attack_steps().iter().map(|s| s.name()).collect();
    assert_eq!(names, ["first", "second", "third"]);

    // The overriding step is the local one, and its super step is Base's.
    let second = derived.attack_step("second").expect("attack step");
    assert_eq!(second.asset().name(), "Derived");
    assert_eq!(
        second.super_attack_step().expect("super step").asset().name(),
        "Base"
    );
    // Inherited steps resolve to the declaring asset.
    assert_eq!(derived.attack_step("first").expect("step").asset().name(), "Base");
}

#[test]
fn tags_and_risk_inherit_and_merge() {
    let lang = base_builder()
        .asset(
            AssetBuilder::new("Base", "System").attack_step(
                AttackStepBuilder::new("access", AttackStepType::Or)
                    .tag("network")
                    .risk(Risk::new(true, false, false)),
            ),
        )
        .asset(
            AssetBuilder::new("Derived", "System").super_asset("Base").attack_step(
                AttackStepBuilder::new("access", AttackStepType::Or)
                    .tag("local")
                    .tag("network"),
            ),
        )
        .build()
        .expect("build should succeed");

    let step = lang
        .asset("Derived")
        .expect("asset")
        .attack_step("access")
        .expect("attack step");
    // Inherited tags first, local additions after, duplicates collapsed.
    assert_eq!(step.tags(), ["network", "local"]);
    assert_eq!(step.local_tags(), ["local", "network"]);
    assert!(step.has_tag("network"));
    // Risk not set locally, so it inherits.
    assert!(step.local_risk().is_none());
    assert_eq!(step.risk(), Some(Risk::new(true, false, false)));
}

#[test]
fn reaches_extends_inherited_list() {
    let lang = reaches_lang(StepsBuilder::extending());
    let step = lang
        .asset("Derived")
        .expect("asset")
        .attack_step("go")
        .expect("attack step");
    let reaches = step.reaches();
    assert_eq!(reaches.len(), 2);
    let targets: Vec<&str> = reaches
        .iter()
        .map(|e| e.terminal_attack_step(&lang).expect("terminal").name())
        .collect();
    assert_eq!(targets, ["inherited", "local"]);
}

#[test]
fn reaches_overrides_inherited_list() {
    let lang = reaches_lang(StepsBuilder::overriding());
    let step = lang
        .asset("Derived")
        .expect("asset")
        .attack_step("go")
        .expect("attack step");
    let reaches = step.reaches();
    assert_eq!(reaches.len(), 1);
    assert_eq!(
        reaches[0].terminal_attack_step(&lang).expect("terminal").name(),
        "local"
    );
}

/// `Base.go` reaches `inherited`; `Derived.go` overrides with a list that
/// reaches `local`, with the given overrides flag.
fn reaches_lang(local_list: StepsBuilder) -> threatlang::Lang {
    base_builder()
        .asset(
            AssetBuilder::new("Base", "System")
                .attack_step(AttackStepBuilder::new("inherited", AttackStepType::Or))
                .attack_step(AttackStepBuilder::new("local", AttackStepType::Or))
                .attack_step(
                    AttackStepBuilder::new("go", AttackStepType::Or).reaches(
                        StepsBuilder::extending()
                            .expression(StepExpressionBuilder::attack_step("inherited")),
                    ),
                ),
        )
        .asset(
            AssetBuilder::new("Derived", "System").super_asset("Base").attack_step(
                AttackStepBuilder::new("go", AttackStepType::Or)
                    .reaches(local_list.expression(StepExpressionBuilder::attack_step("local"))),
            ),
        )
        .build()
        .expect("build should succeed")
}

#[test]
fn local_variable_shadows_inherited() {
    let lang = base_builder()
        .asset(AssetBuilder::new("Peer", "System"))
        .asset(
            AssetBuilder::new("Base", "System").variable(VariableBuilder::new(
                "linked",
                StepExpressionBuilder::field("base_peers"),
            )),
        )
        .asset(
            AssetBuilder::new("Derived", "System")
                .super_asset("Base")
                .variable(VariableBuilder::new(
                    "linked",
                    StepExpressionBuilder::field("derived_peers"),
                )),
        )
        .association(threatlang::AssociationBuilder::new(
            "BaseLink",
            "Base",
            "base_peers",
            threatlang::Multiplicity::ZERO_OR_MORE,
            "Peer",
            "base_owner",
            threatlang::Multiplicity::ZERO_OR_MORE,
        ))
        .association(threatlang::AssociationBuilder::new(
            "DerivedLink",
            "Derived",
            "derived_peers",
            threatlang::Multiplicity::ZERO_OR_MORE,
            "Peer",
            "derived_owner",
            threatlang::Multiplicity::ZERO_OR_MORE,
        ))
        .build()
        .expect("build should succeed");

    let derived = lang.asset("Derived").expect("asset");
    let variable = derived.variable("linked").expect("variable");
    assert_eq!(variable.asset().name(), "Derived");
    // Both the shadowing and the shadowed variable exist; the merged view
    // contains only the local one.
    assert_eq!(derived.variables().len(), 1);
    let base = lang.asset("Base").expect("asset");
    assert_eq!(base.variables().len(), 1);
    assert_eq!(base.variable("linked").expect("variable").asset().name(), "Base");
}

#[test]
fn local_field_shadowing_inherited_is_rejected() {
    let err = base_builder()
        .asset(AssetBuilder::new("Peer", "System"))
        .asset(AssetBuilder::new("Base", "System"))
        .asset(AssetBuilder::new("Derived", "System").super_asset("Base"))
        .association(threatlang::AssociationBuilder::new(
            "BaseLink",
            "Base",
            "link",
            threatlang::Multiplicity::ZERO_OR_MORE,
            "Peer",
            "base_owner",
            threatlang::Multiplicity::ZERO_OR_MORE,
        ))
        .association(threatlang::AssociationBuilder::new(
            "DerivedLink",
            "Derived",
            "link",
            threatlang::Multiplicity::ZERO_OR_MORE,
            "Peer",
            "derived_owner",
            threatlang::Multiplicity::ZERO_OR_MORE,
        ))
        .build()
        .expect_err("build should fail");
    assert!(matches!(
        err,
        LangError::DuplicateName { kind: "field", name } if name == "link"
    ));
}

#[test]
fn icons_inherit_from_super_asset() {
    let lang = base_builder()
        .asset(AssetBuilder::new("Base", "System").svg_icon(*b"<svg/>"))
        .asset(AssetBuilder::new("Derived", "System").super_asset("Base"))
        .build()
        .expect("build should succeed");

    let derived = lang.asset("Derived").expect("asset");
    assert!(derived.local_svg_icon().is_none());
    assert_eq!(derived.svg_icon(), Some(b"<svg/>".as_slice()));
    assert!(derived.png_icon().is_none());
}
