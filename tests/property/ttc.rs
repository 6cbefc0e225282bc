//! TTC mean computations over generated inputs.

use proptest::prelude::*;
use threatlang::TtcExpression;

proptest! {
    #[test]
    fn number_mean_is_identity(value in -1e9f64..1e9) {
        prop_assert_eq!(TtcExpression::Number(value).mean_ttc(), Ok(value));
    }

    #[test]
    fn bernoulli_mean_is_a_threshold(p in 0.0f64..=1.0) {
        let mean = TtcExpression::function("Bernoulli", [p]).mean_ttc().expect("mean");
        if p < 0.5 {
            prop_assert_eq!(mean, 0.0);
        } else {
            prop_assert_eq!(mean, f64::MAX);
        }
        let probability =
            TtcExpression::function("Bernoulli", [p]).mean_probability().expect("probability");
        prop_assert_eq!(probability, p);
    }

    #[test]
    fn addition_mean_is_the_sum(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let expression = TtcExpression::Addition(
            Box::new(TtcExpression::Number(a)),
            Box::new(TtcExpression::Number(b)),
        );
        prop_assert_eq!(expression.mean_ttc(), Ok(a + b));
    }

    #[test]
    fn exponential_mean_is_reciprocal_rate(rate in 0.001f64..1e6) {
        let mean = TtcExpression::function("Exponential", [rate]).mean_ttc().expect("mean");
        prop_assert_eq!(mean, 1.0 / rate);
    }

    #[test]
    fn uniform_mean_is_the_midpoint(a in -1e6f64..1e6, span in 0.0f64..1e6) {
        let b = a + span;
        let mean = TtcExpression::function("Uniform", [a, b]).mean_ttc().expect("mean");
        prop_assert_eq!(mean, (a + b) / 2.0);
    }
}
