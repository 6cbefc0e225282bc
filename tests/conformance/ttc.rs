//! The TTC algebra and distribution catalog.

use super::common::base_builder;
use threatlang::{
    lookup_distribution, AssetBuilder, AttackStepBuilder, AttackStepType, LangError, TtcError,
    TtcExpression, DISTRIBUTION_REGISTRY,
};

fn function(name: &str, arguments: &[f64]) -> TtcExpression {
    TtcExpression::function(name, arguments.to_vec())
}

#[test]
fn number_mean_is_the_number() {
    assert_eq!(TtcExpression::Number(4.25).mean_ttc(), Ok(4.25));
    assert_eq!(TtcExpression::Number(0.0).mean_ttc(), Ok(0.0));
}

#[test]
fn empty_ttc_means_zero_and_has_no_probability() {
    assert_eq!(TtcExpression::Empty.mean_ttc(), Ok(0.0));
    assert!(matches!(
        TtcExpression::Empty.mean_probability(),
        Err(TtcError::Unsupported { .. })
    ));
}

#[test]
fn bernoulli_mean_ttc_is_a_threshold() {
    assert_eq!(function("Bernoulli", &[0.3]).mean_ttc(), Ok(0.0));
    assert_eq!(function("Bernoulli", &[0.49]).mean_ttc(), Ok(0.0));
    assert_eq!(function("Bernoulli", &[0.5]).mean_ttc(), Ok(f64::MAX));
    assert_eq!(function("Bernoulli", &[1.0]).mean_ttc(), Ok(f64::MAX));
    assert_eq!(function("Bernoulli", &[0.3]).mean_probability(), Ok(0.3));
}

#[test]
fn parametric_distribution_means() {
    assert_eq!(function("Binomial", &[10.0, 0.25]).mean_ttc(), Ok(2.5));
    assert_eq!(function("Exponential", &[4.0]).mean_ttc(), Ok(0.25));
    assert_eq!(function("Gamma", &[3.0, 2.0]).mean_ttc(), Ok(6.0));
    let log_normal = function("LogNormal", &[1.0, 2.0]).mean_ttc().expect("mean");
    assert!((log_normal - (3.0f64).exp()).abs() < 1e-9);
    assert_eq!(function("Pareto", &[2.0, 3.0]).mean_ttc(), Ok(3.0));
    assert_eq!(function("Pareto", &[2.0, 1.0]).mean_ttc(), Ok(f64::MAX));
    assert_eq!(function("TruncatedNormal", &[7.0, 1.0]).mean_ttc(), Ok(7.0));
    assert_eq!(function("Uniform", &[2.0, 4.0]).mean_ttc(), Ok(3.0));
}

#[test]
fn difficulty_shorthand_means() {
    assert_eq!(function("EasyAndCertain", &[]).mean_ttc(), Ok(1.0));
    assert_eq!(function("HardAndCertain", &[]).mean_ttc(), Ok(10.0));
    assert_eq!(function("VeryHardAndCertain", &[]).mean_ttc(), Ok(100.0));
    // The uncertain variants add Bernoulli(0.5), whose mean TTC saturates.
    assert_eq!(function("EasyAndUncertain", &[]).mean_ttc(), Ok(f64::MAX));
    assert_eq!(function("HardAndUncertain", &[]).mean_ttc(), Ok(f64::MAX));
    assert_eq!(function("VeryHardAndUncertain", &[]).mean_ttc(), Ok(f64::MAX));
    assert_eq!(function("Infinity", &[]).mean_ttc(), Ok(f64::MAX));
    assert_eq!(function("Zero", &[]).mean_ttc(), Ok(0.0));
}

#[test]
fn enabled_and_disabled_only_support_probability() {
    assert_eq!(function("Enabled", &[]).mean_probability(), Ok(1.0));
    assert_eq!(function("Disabled", &[]).mean_probability(), Ok(0.0));
    assert!(matches!(
        function("Enabled", &[]).mean_ttc(),
        Err(TtcError::Unsupported { .. })
    ));
    assert!(matches!(
        function("Exponential", &[1.0]).mean_probability(),
        Err(TtcError::Unsupported { .. })
    ));
    assert!(matches!(
        TtcExpression::Number(3.0).mean_probability(),
        Err(TtcError::Unsupported { .. })
    ));
}

#[test]
fn arithmetic_composes_means() {
    let sum = TtcExpression::Addition(
        Box::new(function("Exponential", &[0.5])),
        Box::new(TtcExpression::Number(3.0)),
    );
    assert_eq!(sum.mean_ttc(), Ok(5.0));

    let product = TtcExpression::Multiplication(
        Box::new(TtcExpression::Number(4.0)),
        Box::new(function("Uniform", &[1.0, 3.0])),
    );
    assert_eq!(product.mean_ttc(), Ok(8.0));

    let power = TtcExpression::Exponentiation(
        Box::new(TtcExpression::Number(2.0)),
        Box::new(TtcExpression::Number(10.0)),
    );
    assert_eq!(power.mean_ttc(), Ok(1024.0));

    let difference = TtcExpression::Subtraction(
        Box::new(TtcExpression::Number(5.0)),
        Box::new(TtcExpression::Division(
            Box::new(TtcExpression::Number(6.0)),
            Box::new(TtcExpression::Number(3.0)),
        )),
    );
    assert_eq!(difference.mean_ttc(), Ok(3.0));
    assert!(matches!(
        sum.mean_probability(),
        Err(TtcError::Unsupported { .. })
    ));
}

#[test]
fn registry_covers_the_closed_catalog() {
    assert_eq!(DISTRIBUTION_REGISTRY.len(), 18);
    let exponential = lookup_distribution("Exponential").expect("catalog entry");
    assert_eq!(exponential.arity(), 1);
    assert!(lookup_distribution("Exp").is_none());
}

#[test]
fn invalid_arguments_are_query_errors() {
    assert_eq!(
        function("Bernoulli", &[1.5]).mean_ttc(),
        Err(TtcError::InvalidArguments("Bernoulli".to_string()))
    );
    // Wrong arity.
    assert_eq!(
        function("Exponential", &[]).mean_ttc(),
        Err(TtcError::InvalidArguments("Exponential".to_string()))
    );
    // Non-integer trial count.
    assert_eq!(
        function("Binomial", &[1.5, 0.5]).mean_ttc(),
        Err(TtcError::InvalidArguments("Binomial".to_string()))
    );
    // Degenerate range.
    assert_eq!(
        function("Uniform", &[4.0, 2.0]).mean_ttc(),
        Err(TtcError::InvalidArguments("Uniform".to_string()))
    );
    assert_eq!(
        function("NotADistribution", &[]).mean_ttc(),
        Err(TtcError::UnknownDistribution("NotADistribution".to_string()))
    );
}

fn build_with_ttc(ttc: TtcExpression) -> Result<threatlang::Lang, LangError> {
    base_builder()
        .asset(
            AssetBuilder::new("Host", "System")
                .attack_step(AttackStepBuilder::new("access", AttackStepType::Or).ttc(ttc)),
        )
        .build()
}

#[test]
fn linker_validates_distribution_arguments() {
    let err = build_with_ttc(function("Bernoulli", &[-0.1])).expect_err("build should fail");
    assert!(matches!(
        err,
        LangError::InvalidDistributionArguments(name) if name == "Bernoulli"
    ));

    let err = build_with_ttc(function("Gamma", &[1.0])).expect_err("build should fail");
    assert!(matches!(err, LangError::InvalidDistributionArguments(_)));

    let err = build_with_ttc(function("NotADistribution", &[])).expect_err("build should fail");
    assert!(matches!(
        err,
        LangError::UnknownReference {
            kind: "distribution",
            ..
        }
    ));

    let err = build_with_ttc(TtcExpression::Number(f64::NAN)).expect_err("build should fail");
    assert!(matches!(err, LangError::NonFiniteNumber));

    let err = build_with_ttc(TtcExpression::Addition(
        Box::new(TtcExpression::Empty),
        Box::new(TtcExpression::Number(1.0)),
    ))
    .expect_err("build should fail");
    assert!(matches!(err, LangError::NestedEmptyTtc));
}

#[test]
fn linker_accepts_valid_ttc_forms() {
    let lang = build_with_ttc(TtcExpression::Empty).expect("build should succeed");
    let ttc = lang
        .asset("Host")
        .expect("asset")
        .attack_step("access")
        .expect("step")
        .ttc()
        .expect("ttc");
    assert_eq!(ttc, &TtcExpression::Empty);
    assert_eq!(ttc.mean_ttc(), Ok(0.0));

    build_with_ttc(function("EasyAndUncertain", &[])).expect("build should succeed");
}
