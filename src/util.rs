use crate::error::{MdpError, Result};

/// Checks that a numerical value is in the provided interval `[a,b]` and produces
/// an [`MdpError::InvalidConfiguration`] with a helpful message if not
///
/// ### Example
/// ```ignore
/// let value = 2.0;
/// check_interval!(value, 0.0, 1.0)?;
/// ```
/// This fails with the message "Invalid value for \`value\`. Must be in the interval \[0, 1\]."
macro_rules! check_interval {
    ($var:expr, $a:expr, $b:expr) => {
        $crate::util::interval(stringify!($var), $var, $a, $b)
    };
}

pub(crate) use check_interval;

pub fn interval(name: &str, value: f64, a: f64, b: f64) -> Result<()> {
    (value >= a && value <= b).then_some(()).ok_or_else(|| {
        MdpError::InvalidConfiguration(format!(
            "Invalid value for `{}`. Must be in the interval [{}, {}].",
            name, a, b
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_functional() {
        assert!(interval("x", 0.5, 0.0, 1.0).is_ok());
        assert!(interval("x", 0.0, 0.0, 1.0).is_ok(), "lower bound inclusive");
        assert!(interval("x", 1.0, 0.0, 1.0).is_ok(), "upper bound inclusive");
        assert!(interval("x", 1.5, 0.0, 1.0).is_err());
        assert!(interval("x", f64::NAN, 0.0, 1.0).is_err(), "NaN rejected");
    }

    #[test]
    fn check_interval_names_variable() {
        let hole_probability = 2.0;
        let err = check_interval!(hole_probability, 0.0, 1.0).unwrap_err();
        assert_eq!(
            err,
            MdpError::InvalidConfiguration(
                "Invalid value for `hole_probability`. Must be in the interval [0, 1].".into()
            )
        );
    }
}
