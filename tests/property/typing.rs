//! Step-expression typing invariants over generated inheritance chains.

use proptest::prelude::*;
use threatlang::{
    AssetBuilder, AssociationBuilder, CategoryBuilder, LangBuilder, Multiplicity,
    StepExpressionBuilder, StepKind, VariableBuilder,
};

/// A chain `Level0 <- Level1 <- … <- Level{depth-1}` (deeper is more
/// specific) plus a `Root` asset with a field `to{i}` reaching each level and
/// a back field `from{i}` on each level.
fn chain_builder(depth: usize) -> LangBuilder {
    let mut builder = LangBuilder::new()
        .define("id", "org.example.chain")
        .define("version", "0.0.1")
        .category(CategoryBuilder::new("Generated"))
        .asset(AssetBuilder::new("Root", "Generated"));
    for i in 0..depth {
        let mut asset = AssetBuilder::new(format!("Level{}", i), "Generated");
        if i > 0 {
            asset = asset.super_asset(format!("Level{}", i - 1));
        }
        builder = builder.asset(asset).association(AssociationBuilder::new(
            "Reaches",
            "Root",
            format!("to{}", i),
            Multiplicity::ZERO_OR_MORE,
            format!("Level{}", i),
            format!("from{}", i),
            Multiplicity::ZERO_OR_MORE,
        ));
    }
    builder
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn set_operators_target_the_least_upper_bound(
        depth in 1usize..6,
        lhs_raw in 0usize..8,
        rhs_raw in 0usize..8,
    ) {
        let lhs_level = lhs_raw % depth;
        let rhs_level = rhs_raw % depth;
        let lang = chain_builder(depth)
            .asset(
                AssetBuilder::new("Probe", "Generated")
                    .super_asset("Root")
                    .variable(VariableBuilder::new(
                        "scope",
                        StepExpressionBuilder::union(
                            StepExpressionBuilder::field(format!("to{}", lhs_level)),
                            StepExpressionBuilder::field(format!("to{}", rhs_level)),
                        ),
                    )),
            )
            .build()
            .expect("chain language should link");

        let variable = lang.asset("Probe").expect("asset").variable("scope").expect("variable");
        let expected = format!("Level{}", lhs_level.min(rhs_level));
        prop_assert_eq!(variable.target_asset().name(), expected.as_str());

        // The target is a (not necessarily strict) super asset of both
        // children's targets.
        let target = variable.target_asset();
        match variable.step_expression().kind() {
            StepKind::Union(lhs, rhs) => {
                prop_assert!(lhs.target_asset(&lang).is_subtype_of(&target));
                prop_assert!(rhs.target_asset(&lang).is_subtype_of(&target));
                prop_assert_eq!(lhs.source_asset_id(), variable.step_expression().source_asset_id());
                prop_assert_eq!(rhs.source_asset_id(), variable.step_expression().source_asset_id());
            }
            other => prop_assert!(false, "expected union, got {:?}", other),
        }
    }

    #[test]
    fn collect_sources_chain_through_targets(depth in 1usize..6, level_raw in 0usize..8) {
        let level = level_raw % depth;
        let lang = chain_builder(depth)
            .asset(
                AssetBuilder::new("Probe", "Generated")
                    .super_asset("Root")
                    .variable(VariableBuilder::new(
                        "back",
                        StepExpressionBuilder::collect(
                            StepExpressionBuilder::field(format!("to{}", level)),
                            StepExpressionBuilder::field(format!("from{}", level)),
                        ),
                    )),
            )
            .build()
            .expect("chain language should link");

        let variable = lang.asset("Probe").expect("asset").variable("back").expect("variable");
        prop_assert_eq!(variable.target_asset().name(), "Root");
        match variable.step_expression().kind() {
            StepKind::Collect(lhs, rhs) => {
                prop_assert_eq!(rhs.source_asset_id(), lhs.target_asset_id());
            }
            other => prop_assert!(false, "expected collect, got {:?}", other),
        }
    }

    #[test]
    fn sub_type_narrows_along_the_chain(
        depth in 2usize..6,
        broad_raw in 0usize..8,
        narrow_raw in 0usize..8,
    ) {
        let broad = broad_raw % (depth - 1);
        let narrow = broad + 1 + narrow_raw % (depth - 1 - broad);
        let lang = chain_builder(depth)
            .asset(
                AssetBuilder::new("Probe", "Generated")
                    .super_asset("Root")
                    .variable(VariableBuilder::new(
                        "narrowed",
                        StepExpressionBuilder::sub_type(
                            format!("Level{}", narrow),
                            StepExpressionBuilder::field(format!("to{}", broad)),
                        ),
                    )),
            )
            .build()
            .expect("chain language should link");

        let variable = lang.asset("Probe").expect("asset").variable("narrowed").expect("variable");
        let expected = format!("Level{}", narrow);
        prop_assert_eq!(variable.target_asset().name(), expected.as_str());
    }
}
