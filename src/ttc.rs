//! Time-to-compromise expressions and the distribution catalog.
//!
//! Mean TTC is defined compositionally: binary operations apply the
//! corresponding arithmetic to their children's means, `number(v)` yields `v`,
//! and `function(d, args)` delegates to the distribution `d`. Mean probability
//! is only defined for `Enabled`, `Disabled`, and `Bernoulli`.

use crate::error::{LangError, TtcError};

/// A time-to-compromise expression attached to an attack step.
///
/// The distinguished [`Empty`](TtcExpression::Empty) variant represents an
/// explicit "no TTC" and serializes as JSON `null`; its mean TTC is 0. It is
/// distinct from an attack step with no TTC declared at all.
#[derive(Clone, Debug, PartialEq)]
pub enum TtcExpression {
    Addition(Box<TtcExpression>, Box<TtcExpression>),
    Subtraction(Box<TtcExpression>, Box<TtcExpression>),
    Multiplication(Box<TtcExpression>, Box<TtcExpression>),
    Division(Box<TtcExpression>, Box<TtcExpression>),
    Exponentiation(Box<TtcExpression>, Box<TtcExpression>),
    /// A distribution call, e.g. `Exponential(1.0)`.
    Function(String, Vec<f64>),
    /// A numeric constant.
    Number(f64),
    /// The explicit empty TTC.
    Empty,
}

impl TtcExpression {
    /// Shorthand for [`TtcExpression::Function`].
    pub fn function(name: impl Into<String>, arguments: impl Into<Vec<f64>>) -> Self {
        TtcExpression::Function(name.into(), arguments.into())
    }

    /// Returns the mean time-to-compromise of this expression.
    ///
    /// # Errors
    ///
    /// Returns [`TtcError::Unsupported`] if a distribution in the expression
    /// does not define a mean TTC, [`TtcError::UnknownDistribution`] or
    /// [`TtcError::InvalidArguments`] if the expression was constructed
    /// directly with an invalid function call.
    pub fn mean_ttc(&self) -> Result<f64, TtcError> {
        match self {
            TtcExpression::Addition(lhs, rhs) => Ok(lhs.mean_ttc()? + rhs.mean_ttc()?),
            TtcExpression::Subtraction(lhs, rhs) => Ok(lhs.mean_ttc()? - rhs.mean_ttc()?),
            TtcExpression::Multiplication(lhs, rhs) => Ok(lhs.mean_ttc()? * rhs.mean_ttc()?),
            TtcExpression::Division(lhs, rhs) => Ok(lhs.mean_ttc()? / rhs.mean_ttc()?),
            TtcExpression::Exponentiation(lhs, rhs) => Ok(lhs.mean_ttc()?.powf(rhs.mean_ttc()?)),
            TtcExpression::Function(name, arguments) => {
                let distribution = lookup_distribution(name)
                    .ok_or_else(|| TtcError::UnknownDistribution(name.clone()))?;
                distribution.mean_ttc(arguments)
            }
            TtcExpression::Number(value) => Ok(*value),
            TtcExpression::Empty => Ok(0.0),
        }
    }

    /// Returns the mean probability of this expression.
    ///
    /// Only `Enabled`, `Disabled`, and `Bernoulli` function calls define a
    /// mean probability.
    ///
    /// # Errors
    ///
    /// Returns [`TtcError::Unsupported`] for every other form.
    pub fn mean_probability(&self) -> Result<f64, TtcError> {
        match self {
            TtcExpression::Function(name, arguments) => {
                let distribution = lookup_distribution(name)
                    .ok_or_else(|| TtcError::UnknownDistribution(name.clone()))?;
                distribution.mean_probability(arguments)
            }
            _ => Err(TtcError::Unsupported {
                operation: "mean probability",
            }),
        }
    }

    /// Validates every distribution call and number literal in the
    /// expression. The empty TTC is only valid as the entire expression.
    pub(crate) fn check(&self) -> Result<(), LangError> {
        match self {
            TtcExpression::Empty => Ok(()),
            other => other.check_nested(),
        }
    }

    fn check_nested(&self) -> Result<(), LangError> {
        match self {
            TtcExpression::Addition(lhs, rhs)
            | TtcExpression::Subtraction(lhs, rhs)
            | TtcExpression::Multiplication(lhs, rhs)
            | TtcExpression::Division(lhs, rhs)
            | TtcExpression::Exponentiation(lhs, rhs) => {
                lhs.check_nested()?;
                rhs.check_nested()
            }
            TtcExpression::Function(name, arguments) => {
                let distribution =
                    lookup_distribution(name).ok_or_else(|| LangError::UnknownReference {
                        kind: "distribution",
                        name: name.clone(),
                    })?;
                distribution.check_arguments(arguments)
            }
            TtcExpression::Number(value) => {
                if value.is_finite() {
                    Ok(())
                } else {
                    Err(LangError::NonFiniteNumber)
                }
            }
            TtcExpression::Empty => Err(LangError::NestedEmptyTtc),
        }
    }
}

// ─── Distribution catalog ───────────────────────────────────────────────────

/// A distribution catalog entry: name, arity, argument constraints, and the
/// mean computations it supports.
pub struct Distribution {
    name: &'static str,
    arity: usize,
    constraint: fn(&[f64]) -> bool,
    mean_ttc: Option<fn(&[f64]) -> f64>,
    mean_probability: Option<fn(&[f64]) -> f64>,
}

impl Distribution {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Checks `arguments` against this distribution's arity and constraints.
    /// All arguments must be finite.
    ///
    /// # Errors
    ///
    /// Returns [`LangError::InvalidDistributionArguments`] on failure.
    pub fn check_arguments(&self, arguments: &[f64]) -> Result<(), LangError> {
        if self.arguments_valid(arguments) {
            Ok(())
        } else {
            Err(LangError::InvalidDistributionArguments(
                self.name.to_string(),
            ))
        }
    }

    fn arguments_valid(&self, arguments: &[f64]) -> bool {
        arguments.len() == self.arity
            && arguments.iter().all(|a| a.is_finite())
            && (self.constraint)(arguments)
    }

    /// Returns the mean TTC for `arguments`.
    ///
    /// # Errors
    ///
    /// Returns [`TtcError::Unsupported`] if this distribution has no mean TTC,
    /// or [`TtcError::InvalidArguments`] if `arguments` fail the constraints.
    pub fn mean_ttc(&self, arguments: &[f64]) -> Result<f64, TtcError> {
        let mean = self.mean_ttc.ok_or(TtcError::Unsupported {
            operation: "mean TTC",
        })?;
        if !self.arguments_valid(arguments) {
            return Err(TtcError::InvalidArguments(self.name.to_string()));
        }
        Ok(mean(arguments))
    }

    /// Returns the mean probability for `arguments`.
    ///
    /// # Errors
    ///
    /// Returns [`TtcError::Unsupported`] if this distribution has no mean
    /// probability, or [`TtcError::InvalidArguments`] if `arguments` fail the
    /// constraints.
    pub fn mean_probability(&self, arguments: &[f64]) -> Result<f64, TtcError> {
        let mean = self.mean_probability.ok_or(TtcError::Unsupported {
            operation: "mean probability",
        })?;
        if !self.arguments_valid(arguments) {
            return Err(TtcError::InvalidArguments(self.name.to_string()));
        }
        Ok(mean(arguments))
    }
}

fn no_constraint(_: &[f64]) -> bool {
    true
}

fn probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

fn positive(v: f64) -> bool {
    v > 0.0
}

fn non_negative_integer(v: f64) -> bool {
    v >= 0.0 && v.floor() == v
}

fn bernoulli_mean_ttc(p: f64) -> f64 {
    if p < 0.5 {
        0.0
    } else {
        f64::MAX
    }
}

/// The closed distribution catalog.
///
/// The combined-difficulty entries are defined by delegation, e.g.
/// `EasyAndUncertain` is the mean of `Bernoulli(0.5) + Exponential(1.0)`.
pub static DISTRIBUTION_REGISTRY: &[Distribution] = &[
    Distribution {
        name: "Bernoulli",
        arity: 1,
        constraint: |args| probability(args[0]),
        mean_ttc: Some(|args| bernoulli_mean_ttc(args[0])),
        mean_probability: Some(|args| args[0]),
    },
    Distribution {
        name: "Binomial",
        arity: 2,
        constraint: |args| non_negative_integer(args[0]) && probability(args[1]),
        mean_ttc: Some(|args| args[0] * args[1]),
        mean_probability: None,
    },
    Distribution {
        name: "Exponential",
        arity: 1,
        constraint: |args| positive(args[0]),
        mean_ttc: Some(|args| 1.0 / args[0]),
        mean_probability: None,
    },
    Distribution {
        name: "Gamma",
        arity: 2,
        constraint: |args| positive(args[0]) && positive(args[1]),
        mean_ttc: Some(|args| args[0] * args[1]),
        mean_probability: None,
    },
    Distribution {
        name: "LogNormal",
        arity: 2,
        constraint: |args| positive(args[1]),
        mean_ttc: Some(|args| (args[0] + args[1] * args[1] / 2.0).exp()),
        mean_probability: None,
    },
    Distribution {
        name: "Pareto",
        arity: 2,
        constraint: |args| positive(args[0]) && positive(args[1]),
        mean_ttc: Some(|args| {
            let (min, shape) = (args[0], args[1]);
            if shape > 1.0 {
                shape * min / (shape - 1.0)
            } else {
                f64::MAX
            }
        }),
        mean_probability: None,
    },
    Distribution {
        name: "TruncatedNormal",
        arity: 2,
        constraint: |args| positive(args[1]),
        mean_ttc: Some(|args| args[0]),
        mean_probability: None,
    },
    Distribution {
        name: "Uniform",
        arity: 2,
        constraint: |args| args[0] <= args[1],
        mean_ttc: Some(|args| (args[0] + args[1]) / 2.0),
        mean_probability: None,
    },
    Distribution {
        name: "EasyAndCertain",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: Some(|_| 1.0 / 1.0),
        mean_probability: None,
    },
    Distribution {
        name: "EasyAndUncertain",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: Some(|_| bernoulli_mean_ttc(0.5) + 1.0 / 1.0),
        mean_probability: None,
    },
    Distribution {
        name: "HardAndCertain",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: Some(|_| 1.0 / 0.1),
        mean_probability: None,
    },
    Distribution {
        name: "HardAndUncertain",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: Some(|_| bernoulli_mean_ttc(0.5) + 1.0 / 0.1),
        mean_probability: None,
    },
    Distribution {
        name: "VeryHardAndCertain",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: Some(|_| 1.0 / 0.01),
        mean_probability: None,
    },
    Distribution {
        name: "VeryHardAndUncertain",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: Some(|_| bernoulli_mean_ttc(0.5) + 1.0 / 0.01),
        mean_probability: None,
    },
    Distribution {
        name: "Infinity",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: Some(|_| f64::MAX),
        mean_probability: None,
    },
    Distribution {
        name: "Zero",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: Some(|_| 0.0),
        mean_probability: None,
    },
    Distribution {
        name: "Enabled",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: None,
        mean_probability: Some(|_| 1.0),
    },
    Distribution {
        name: "Disabled",
        arity: 0,
        constraint: no_constraint,
        mean_ttc: None,
        mean_probability: Some(|_| 0.0),
    },
];

/// Looks up a distribution by name in the catalog.
pub fn lookup_distribution(name: &str) -> Option<&'static Distribution> {
    DISTRIBUTION_REGISTRY.iter().find(|d| d.name == name)
}
