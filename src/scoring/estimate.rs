/// Why an estimator fell back to its safe default instead of computing normally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Degradation {
    #[error("insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("zero variance across {samples} samples")]
    ZeroVariance { samples: usize },
    #[error("negative elapsed time ({hours:.3}h), clamped to zero")]
    ClockSkew { hours: f64 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Estimator output: always carries a usable value, optionally tagged with
/// the reason it is a fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Estimate<T> {
    Computed(T),
    Degraded { value: T, reason: Degradation },
}

impl<T> Estimate<T> {
    pub fn degraded(value: T, reason: Degradation) -> Self {
        Estimate::Degraded { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Estimate::Computed(v) => v,
            Estimate::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Estimate::Computed(v) => v,
            Estimate::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Estimate::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&Degradation> {
        match self {
            Estimate::Computed(_) => None,
            Estimate::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Estimate<U> {
        match self {
            Estimate::Computed(v) => Estimate::Computed(f(v)),
            Estimate::Degraded { value, reason } => Estimate::Degraded { value: f(value), reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computed_has_no_reason() {
        let e = Estimate::Computed(3.0);
        assert_eq!(*e.value(), 3.0);
        assert!(!e.is_degraded());
        assert!(e.reason().is_none());
    }

    #[test]
    fn test_degraded_keeps_value_and_reason() {
        let e = Estimate::degraded(0.0, Degradation::ZeroVariance { samples: 4 });
        assert!(e.is_degraded());
        assert_eq!(e.reason(), Some(&Degradation::ZeroVariance { samples: 4 }));
        let mapped = e.map(|v| v + 1.0);
        assert_eq!(mapped.into_value(), 1.0);
    }

    #[test]
    fn test_reason_messages() {
        let msg = Degradation::InsufficientData { needed: 2, got: 1 }.to_string();
        assert_eq!(msg, "insufficient data: need at least 2 samples, got 1");
    }
}
